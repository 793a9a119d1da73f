//! Withdrawal record.

use serde::{Deserialize, Serialize};
use taskpay_types::{Amount, Timestamp, UserId, WithdrawalId, WithdrawalStatus};

/// A user's request to withdraw part of their balance.
///
/// The balance is debited when the record is created; status transitions are
/// performed only by an administrative actor. Records are never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub id: WithdrawalId,
    pub user: UserId,
    pub amount: Amount,
    /// Payout method chosen by the user (e.g. a wallet network).
    pub method: String,
    /// Method-specific payout details (address, account id).
    pub details: String,
    pub status: WithdrawalStatus,
    pub created_at: Timestamp,
}
