//! Withdrawal ledger.
//!
//! Requesting a withdrawal debits the balance and appends a pending record in
//! one atomic step. Status transitions are admin-only and follow the state
//! machine `pending → approved | rejected`, `approved → completed`. Rejecting
//! a withdrawal refunds the debited amount in the same transaction — funds
//! are never stranded.

use tracing::info;

use taskpay_store::WithdrawalRecord;
use taskpay_types::{Amount, Timestamp, UserId, WithdrawalId, WithdrawalStatus};

use crate::{Ledger, LedgerError};

impl Ledger {
    /// Convert available balance into a pending withdrawal request.
    pub fn request_withdrawal(
        &self,
        user_id: &UserId,
        amount: Amount,
        method: &str,
        details: &str,
    ) -> Result<WithdrawalRecord, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("amount must be positive".into()));
        }
        if amount < self.config.min_withdrawal {
            return Err(LedgerError::InvalidAmount(format!(
                "minimum withdrawal is {}",
                self.config.min_withdrawal
            )));
        }

        let mut txn = self.store.write()?;
        let Some(mut user) = txn.get_user(user_id)? else {
            return Err(LedgerError::Unauthorized);
        };
        let remaining = user.balance.checked_sub(amount).ok_or(
            LedgerError::InsufficientBalance {
                requested: amount,
                available: user.balance,
            },
        )?;
        user.balance = remaining;

        let id = txn.next_withdrawal_id()?;
        let record = WithdrawalRecord {
            id,
            user: user.id.clone(),
            amount,
            method: method.trim().to_owned(),
            details: details.trim().to_owned(),
            status: WithdrawalStatus::Pending,
            created_at: Timestamp::now(),
        };
        txn.put_user(&user)?;
        txn.put_withdrawal(&record)?;
        txn.commit()?;

        info!(user = %record.user, withdrawal = %id, amount = %amount, "withdrawal requested");
        Ok(record)
    }

    /// The caller's withdrawal history, newest first.
    pub fn withdrawals_for(&self, user_id: &UserId) -> Result<Vec<WithdrawalRecord>, LedgerError> {
        let txn = self.store.read()?;
        let mut records = txn.iter_withdrawals_for(user_id)?;
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }

    /// Administrative state transition.
    ///
    /// Rejecting a pending withdrawal credits the debited amount back to the
    /// owner in the same transaction.
    pub fn set_withdrawal_status(
        &self,
        id: WithdrawalId,
        next: WithdrawalStatus,
    ) -> Result<WithdrawalRecord, LedgerError> {
        let mut txn = self.store.write()?;
        let Some(mut record) = txn.get_withdrawal(id)? else {
            return Err(LedgerError::NotFound(format!("withdrawal {id}")));
        };
        if !record.status.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                from: record.status,
                to: next,
            });
        }

        if next == WithdrawalStatus::Rejected {
            let Some(mut user) = txn.get_user(&record.user)? else {
                return Err(LedgerError::NotFound(format!("user {}", record.user)));
            };
            user.balance = user.balance.saturating_add(record.amount);
            txn.put_user(&user)?;
        }

        let previous = record.status;
        record.status = next;
        txn.put_withdrawal(&record)?;
        txn.commit()?;

        info!(
            withdrawal = %id,
            from = previous.as_str(),
            to = next.as_str(),
            "withdrawal status updated"
        );
        Ok(record)
    }
}
