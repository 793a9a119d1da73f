//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use taskpay_ledger::LedgerError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RpcError::Unauthorized | RpcError::Ledger(LedgerError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            RpcError::Ledger(LedgerError::NotFound(_)) => (StatusCode::NOT_FOUND, self.to_string()),
            RpcError::Ledger(LedgerError::InvalidCode) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            RpcError::Ledger(LedgerError::InvalidAmount(_))
            | RpcError::Ledger(LedgerError::InsufficientBalance { .. }) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            RpcError::Ledger(LedgerError::InvalidTransition { .. })
            | RpcError::Ledger(LedgerError::Conflict(_)) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            RpcError::Ledger(LedgerError::Storage(e)) => {
                tracing::error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
            RpcError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            RpcError::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
