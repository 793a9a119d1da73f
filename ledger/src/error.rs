use taskpay_store::StoreError;
use taskpay_types::{Amount, WithdrawalStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no resolvable caller identity")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("verification code does not match")]
    InvalidCode,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("cannot move withdrawal from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition {
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },

    /// A concurrent write collided; the caller may safely retry.
    #[error("write conflict, retry: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => LedgerError::Conflict(msg),
            other => LedgerError::Storage(other),
        }
    }
}
