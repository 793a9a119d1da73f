//! The TaskPay core ledger.
//!
//! Coordinates the four operations with real monetary risk: mapping a request
//! to exactly one durable user record (including anonymous-to-verified
//! merges), binding a referral relationship at most once, crediting task
//! rewards and referral commissions idempotently, and debiting withdrawals.
//!
//! Every mutating operation runs inside a single store write transaction, so
//! concurrent duplicate requests produce exactly one net effect.

pub mod admin;
pub mod error;
pub mod identity;
pub mod referral;
pub mod rewards;
pub mod withdrawals;

pub use admin::{LedgerStats, TaskDraft};
pub use error::LedgerError;
pub use identity::{ResolveRequest, VerifiedProfile};
pub use referral::{RefCandidate, ReferralOverview, ReferredUser};
pub use rewards::{TaskView, VerifyOutcome};

use std::sync::Arc;
use taskpay_store::Store;
use taskpay_types::Amount;

/// Default referral commission rate in basis points (5%).
///
/// The single source of truth for the rate; everything else reads it from
/// [`LedgerConfig`].
pub const DEFAULT_REFERRAL_RATE_BPS: u32 = 500;

/// Tunable policy for the ledger.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Referral commission rate in basis points of the task reward.
    pub referral_rate_bps: u32,
    /// Smallest withdrawal a user may request.
    pub min_withdrawal: Amount,
    /// Whether requests without a verified principal are served.
    pub allow_anonymous: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            referral_rate_bps: DEFAULT_REFERRAL_RATE_BPS,
            min_withdrawal: Amount::from_raw(100),
            allow_anonymous: true,
        }
    }
}

/// The ledger engine. Cheap to clone; all state lives in the store.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn Store>,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::identity::{ResolveRequest, VerifiedProfile};
    use taskpay_store::{MemoryStore, TaskRecord, UserRecord};
    use taskpay_types::UserId;

    pub fn ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryStore::new()), LedgerConfig::default())
    }

    pub fn ledger_with(config: LedgerConfig) -> Ledger {
        Ledger::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn profile(id: i64, username: Option<&str>) -> VerifiedProfile {
        VerifiedProfile {
            id: UserId::from_telegram(id),
            first_name: Some(format!("user{id}")),
            last_name: None,
            username: username.map(str::to_owned),
        }
    }

    /// Resolve a verified user with no anonymous id and no referral.
    pub fn resolve_verified(ledger: &Ledger, id: i64) -> UserRecord {
        ledger
            .resolve(&ResolveRequest {
                profile: Some(profile(id, None)),
                anon_id: None,
                referral: None,
                admin_override: None,
            })
            .expect("resolve")
    }

    pub fn make_task(ledger: &Ledger, reward_raw: u64, code: &str) -> TaskRecord {
        ledger
            .create_task(TaskDraft {
                title: "Join the channel".into(),
                link: "https://example.com/channel".into(),
                description: "Join and grab the code".into(),
                reward: Amount::from_raw(reward_raw),
                code: code.into(),
                active: true,
            })
            .expect("create task")
    }
}
