//! User record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use taskpay_types::{Amount, TaskId, Timestamp, UserId};

/// Per-user state: profile, balances, referral links, and completions.
///
/// `referrer` is set at most once and never equals the user's own id.
/// `completed_tasks` only ever grows; a (user, task) membership is the unit
/// of crediting idempotency.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Spendable balance.
    pub balance: Amount,
    /// Cumulative lifetime commission earned from referred users.
    pub referral_earnings: Amount,
    /// The user who invited this user, bound at most once.
    pub referrer: Option<UserId>,
    /// Users who name this user as their referrer.
    pub referrals: BTreeSet<UserId>,
    /// Tasks this user has completed and been credited for.
    pub completed_tasks: BTreeSet<TaskId>,
    pub created_at: Timestamp,
}

impl UserRecord {
    /// A fresh record with zero balances and empty sets.
    pub fn new(id: UserId, now: Timestamp) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            username: None,
            balance: Amount::ZERO,
            referral_earnings: Amount::ZERO,
            referrer: None,
            referrals: BTreeSet::new(),
            completed_tasks: BTreeSet::new(),
            created_at: now,
        }
    }
}
