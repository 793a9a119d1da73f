//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use taskpay_ledger::{LedgerConfig, DEFAULT_REFERRAL_RATE_BPS};
use taskpay_types::Amount;

use crate::NodeError;

/// Configuration for a TaskPay node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the LMDB store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Port the HTTP API listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Bot token used to derive the init-data verification secret.
    #[serde(default)]
    pub bot_token: String,

    /// Bot username used to build referral deep links.
    #[serde(default = "default_bot_username")]
    pub bot_username: String,

    /// Public base URL of the mini-app, for web referral links.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Shared secret for the admin surface. Empty disables it.
    #[serde(default)]
    pub admin_secret: String,

    /// Whether requests without a verified principal are served.
    #[serde(default = "default_true")]
    pub allow_anonymous: bool,

    /// Referral commission rate in basis points.
    #[serde(default = "default_referral_rate_bps")]
    pub referral_rate_bps: u32,

    /// Smallest withdrawal a user may request, in display units.
    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal: f64,

    /// Maximum accepted age of a signed auth payload, in seconds. 0 disables
    /// the freshness check.
    #[serde(default = "default_auth_max_age_secs")]
    pub auth_max_age_secs: u64,

    /// Seed a handful of demo tasks on first start.
    #[serde(default)]
    pub seed_demo_tasks: bool,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./taskpay_data")
}

fn default_map_size_mb() -> usize {
    256
}

fn default_listen_port() -> u16 {
    8080
}

fn default_bot_username() -> String {
    "taskpay_bot".to_string()
}

fn default_public_url() -> String {
    "https://app.taskpay.example".to_string()
}

fn default_true() -> bool {
    true
}

fn default_referral_rate_bps() -> u32 {
    DEFAULT_REFERRAL_RATE_BPS
}

fn default_min_withdrawal() -> f64 {
    1.0
}

fn default_auth_max_age_secs() -> u64 {
    86_400
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// The ledger policy carried by this configuration.
    pub fn ledger_config(&self) -> Result<LedgerConfig, NodeError> {
        let min_withdrawal = Amount::from_major(self.min_withdrawal).ok_or_else(|| {
            NodeError::Config(format!("invalid min_withdrawal: {}", self.min_withdrawal))
        })?;
        Ok(LedgerConfig {
            referral_rate_bps: self.referral_rate_bps,
            min_withdrawal,
            allow_anonymous: self.allow_anonymous,
        })
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            listen_port: default_listen_port(),
            bot_token: String::new(),
            bot_username: default_bot_username(),
            public_url: default_public_url(),
            admin_secret: String::new(),
            allow_anonymous: default_true(),
            referral_rate_bps: default_referral_rate_bps(),
            min_withdrawal: default_min_withdrawal(),
            auth_max_age_secs: default_auth_max_age_secs(),
            seed_demo_tasks: false,
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.listen_port, config.listen_port);
        assert_eq!(parsed.referral_rate_bps, config.referral_rate_bps);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.referral_rate_bps, 500);
        assert_eq!(config.log_level, "info");
        assert!(config.allow_anonymous);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            listen_port = 9999
            referral_rate_bps = 1000
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.listen_port, 9999);
        assert_eq!(config.referral_rate_bps, 1000);
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/taskpay.toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn ledger_config_converts_min_withdrawal() {
        let toml = "min_withdrawal = 2.5";
        let config = NodeConfig::from_toml_str(toml).unwrap();
        let ledger = config.ledger_config().unwrap();
        assert_eq!(ledger.min_withdrawal, Amount::from_raw(250));

        let bad = NodeConfig {
            min_withdrawal: -1.0,
            ..NodeConfig::default()
        };
        assert!(bad.ledger_config().is_err());
    }
}
