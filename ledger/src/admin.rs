//! Administrative operations: task CRUD, listings, and aggregate stats.

use tracing::info;

use taskpay_store::{TaskRecord, UserRecord, WithdrawalRecord};
use taskpay_types::{Amount, TaskId, Timestamp, WithdrawalStatus};

use crate::{Ledger, LedgerError};

/// Fields an administrator supplies when creating or editing a task.
#[derive(Clone, Debug)]
pub struct TaskDraft {
    pub title: String,
    pub link: String,
    pub description: String,
    pub reward: Amount,
    pub code: String,
    pub active: bool,
}

/// Aggregate service statistics for the admin console.
#[derive(Clone, Debug)]
pub struct LedgerStats {
    pub users: u64,
    pub tasks: u64,
    /// Sum of all user balances — the service's outstanding liability.
    pub total_balance: Amount,
    pub total_referral_earnings: Amount,
    pub pending_withdrawals: u64,
    pub pending_amount: Amount,
}

impl Ledger {
    pub fn create_task(&self, draft: TaskDraft) -> Result<TaskRecord, LedgerError> {
        let mut txn = self.store.write()?;
        let id = txn.next_task_id()?;
        let record = TaskRecord {
            id,
            title: draft.title,
            link: draft.link,
            description: draft.description,
            reward: draft.reward,
            code: draft.code,
            active: draft.active,
            created_at: Timestamp::now(),
        };
        txn.put_task(&record)?;
        txn.commit()?;
        info!(task = %id, reward = %record.reward, "task created");
        Ok(record)
    }

    pub fn update_task(&self, id: TaskId, draft: TaskDraft) -> Result<TaskRecord, LedgerError> {
        let mut txn = self.store.write()?;
        let Some(existing) = txn.get_task(id)? else {
            return Err(LedgerError::NotFound(format!("task {id}")));
        };
        let record = TaskRecord {
            id,
            title: draft.title,
            link: draft.link,
            description: draft.description,
            reward: draft.reward,
            code: draft.code,
            active: draft.active,
            created_at: existing.created_at,
        };
        txn.put_task(&record)?;
        txn.commit()?;
        info!(task = %id, "task updated");
        Ok(record)
    }

    pub fn delete_task(&self, id: TaskId) -> Result<(), LedgerError> {
        let mut txn = self.store.write()?;
        txn.delete_task(id).map_err(|e| match e {
            taskpay_store::StoreError::NotFound(key) => LedgerError::NotFound(key),
            other => other.into(),
        })?;
        txn.commit()?;
        info!(task = %id, "task deleted");
        Ok(())
    }

    /// Every task, inactive included, codes and all — admin view only.
    pub fn list_tasks(&self) -> Result<Vec<TaskRecord>, LedgerError> {
        let txn = self.store.read()?;
        Ok(txn.iter_tasks()?)
    }

    pub fn list_users(&self) -> Result<Vec<UserRecord>, LedgerError> {
        let txn = self.store.read()?;
        Ok(txn.iter_users()?)
    }

    pub fn list_withdrawals(&self) -> Result<Vec<WithdrawalRecord>, LedgerError> {
        let txn = self.store.read()?;
        let mut records = txn.iter_withdrawals()?;
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }

    pub fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let txn = self.store.read()?;
        let mut total_balance = Amount::ZERO;
        let mut total_referral_earnings = Amount::ZERO;
        for user in txn.iter_users()? {
            total_balance = total_balance.saturating_add(user.balance);
            total_referral_earnings =
                total_referral_earnings.saturating_add(user.referral_earnings);
        }
        let mut pending_withdrawals = 0;
        let mut pending_amount = Amount::ZERO;
        for withdrawal in txn.iter_withdrawals()? {
            if withdrawal.status == WithdrawalStatus::Pending {
                pending_withdrawals += 1;
                pending_amount = pending_amount.saturating_add(withdrawal.amount);
            }
        }
        Ok(LedgerStats {
            users: txn.user_count()?,
            tasks: txn.iter_tasks()?.len() as u64,
            total_balance,
            total_referral_earnings,
            pending_withdrawals,
            pending_amount,
        })
    }
}
