//! Axum-based RPC server.

use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use taskpay_auth::InitDataVerifier;
use taskpay_ledger::Ledger;

use crate::error::RpcError;
use crate::metrics::RpcMetrics;
use crate::{admin, handlers};

/// Shared state behind every handler.
pub struct AppState {
    pub ledger: Ledger,
    pub verifier: InitDataVerifier,
    pub auth_max_age_secs: u64,
    pub admin_secret: String,
    pub bot_username: String,
    pub public_url: String,
    pub metrics: RpcMetrics,
}

/// Build the full API router. The mini-app talks cross-origin, so CORS is
/// permissive just like the original deployment.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/me", get(handlers::me))
        .route("/tasks", get(handlers::tasks))
        .route("/tasks/:id/verify", post(handlers::verify_task))
        .route("/referrals", get(handlers::referrals))
        .route(
            "/withdraw",
            get(handlers::withdrawals).post(handlers::request_withdrawal),
        )
        .route("/metrics", get(handlers::metrics))
        .route("/admin/login", post(admin::login))
        .route(
            "/admin/tasks",
            get(admin::list_tasks).post(admin::create_task),
        )
        .route(
            "/admin/tasks/:id",
            put(admin::update_task).delete(admin::delete_task),
        )
        .route("/admin/users", get(admin::list_users))
        .route("/admin/withdrawals", get(admin::list_withdrawals))
        .route(
            "/admin/withdrawals/:id/status",
            post(admin::update_withdrawal_status),
        )
        .route("/admin/stats", get(admin::stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct RpcServer {
    pub port: u16,
}

impl RpcServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Bind and serve until the listener fails or the task is dropped.
    pub async fn start(&self, state: Arc<AppState>) -> Result<(), RpcError> {
        let app = router(state);
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        info!("RPC server listening on {addr}");
        axum::serve(listener, app)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
