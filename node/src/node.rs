//! Component wiring and lifecycle.

use std::sync::Arc;
use tracing::info;

use taskpay_auth::InitDataVerifier;
use taskpay_ledger::Ledger;
use taskpay_rpc::{AppState, RpcMetrics, RpcServer};
use taskpay_store::Store;
use taskpay_store_lmdb::LmdbStore;

use crate::config::NodeConfig;
use crate::seed::seed_demo_tasks;
use crate::NodeError;

/// A fully wired TaskPay service instance.
pub struct TaskpayNode {
    config: NodeConfig,
    state: Arc<AppState>,
}

impl TaskpayNode {
    /// Open the store and wire every component; seeds demo data when the
    /// config asks for it.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let store: Arc<dyn Store> = Arc::new(LmdbStore::open(
            &config.data_dir.join("db"),
            config.map_size_mb * 1024 * 1024,
        )?);

        if config.seed_demo_tasks {
            seed_demo_tasks(&store)?;
        }

        if config.bot_token.is_empty() {
            tracing::warn!("bot_token is empty; signed auth payloads will not verify");
        }
        if config.admin_secret.is_empty() {
            tracing::warn!("admin_secret is empty; the admin surface is disabled");
        }

        let ledger = Ledger::new(store, config.ledger_config()?);
        let state = Arc::new(AppState {
            ledger,
            verifier: InitDataVerifier::new(&config.bot_token),
            auth_max_age_secs: config.auth_max_age_secs,
            admin_secret: config.admin_secret.clone(),
            bot_username: config.bot_username.clone(),
            public_url: config.public_url.clone(),
            metrics: RpcMetrics::new(),
        });

        Ok(Self { config, state })
    }

    /// Serve the API until the process receives a shutdown signal.
    pub async fn run(&self) -> Result<(), NodeError> {
        let server = RpcServer::new(self.config.listen_port);
        tokio::select! {
            result = server.start(Arc::clone(&self.state)) => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
            }
        }
        Ok(())
    }
}
