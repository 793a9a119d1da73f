//! TaskPay daemon — entry point for running the service.

use clap::Parser;
use std::path::PathBuf;

use taskpay_node::{NodeConfig, TaskpayNode};

#[derive(Parser)]
#[command(name = "taskpay-daemon", about = "TaskPay mini-app backend daemon")]
struct Cli {
    /// Data directory for the LMDB store.
    #[arg(long, env = "TASKPAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Port for the HTTP API.
    #[arg(long, env = "TASKPAY_PORT")]
    port: Option<u16>,

    /// Bot token used to verify signed auth payloads.
    #[arg(long, env = "TASKPAY_BOT_TOKEN")]
    bot_token: Option<String>,

    /// Bot username used in referral deep links.
    #[arg(long, env = "TASKPAY_BOT_USERNAME")]
    bot_username: Option<String>,

    /// Public base URL of the mini-app.
    #[arg(long, env = "TASKPAY_PUBLIC_URL")]
    public_url: Option<String>,

    /// Shared secret for the admin surface.
    #[arg(long, env = "TASKPAY_ADMIN_SECRET")]
    admin_secret: Option<String>,

    /// Serve requests without a verified principal.
    #[arg(long, env = "TASKPAY_ALLOW_ANONYMOUS")]
    allow_anonymous: Option<bool>,

    /// Seed demo tasks on first start.
    #[arg(long, env = "TASKPAY_SEED_DEMO_TASKS")]
    seed_demo_tasks: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "TASKPAY_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config: Option<NodeConfig> = if let Some(ref config_path) = cli.config {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match NodeConfig::from_toml_str(&contents) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    eprintln!("failed to parse config file: {e}, using CLI defaults");
                    None
                }
            },
            Err(e) => {
                eprintln!(
                    "failed to read config file {}: {e}, using CLI defaults",
                    config_path.display()
                );
                None
            }
        }
    } else {
        None
    };

    let base = file_config.unwrap_or_default();
    let config = NodeConfig {
        data_dir: cli.data_dir.unwrap_or(base.data_dir),
        listen_port: cli.port.unwrap_or(base.listen_port),
        bot_token: cli.bot_token.unwrap_or(base.bot_token),
        bot_username: cli.bot_username.unwrap_or(base.bot_username),
        public_url: cli.public_url.unwrap_or(base.public_url),
        admin_secret: cli.admin_secret.unwrap_or(base.admin_secret),
        allow_anonymous: cli.allow_anonymous.unwrap_or(base.allow_anonymous),
        seed_demo_tasks: cli.seed_demo_tasks || base.seed_demo_tasks,
        log_level: cli.log_level,
        ..base
    };

    taskpay_utils::init_tracing(&config.log_level);
    tracing::info!(
        port = config.listen_port,
        data_dir = %config.data_dir.display(),
        "starting TaskPay node"
    );

    let node = TaskpayNode::new(config)?;
    node.run().await?;

    tracing::info!("TaskPay daemon exited cleanly");
    Ok(())
}
