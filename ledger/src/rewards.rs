//! Task verification and reward crediting.
//!
//! The (user, task) completion pair is the unit of idempotency: it is
//! recorded at most once and never removed. The completion check, the user
//! credit, and the referrer commission all happen inside one write
//! transaction, so duplicate submissions — sequential or concurrent — credit
//! exactly once.

use serde::Serialize;
use tracing::info;

use taskpay_store::TaskRecord;
use taskpay_types::{Amount, TaskId, TaskStatus, UserId};

use crate::{Ledger, LedgerError};

/// Outcome of a verification attempt that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// First completion: reward credited, commission paid if a referrer exists.
    Credited {
        reward: Amount,
        commission: Option<Amount>,
    },
    /// The pair was already recorded; nothing changed.
    AlreadyCompleted,
}

/// A task as presented to one user: the secret code never leaves the server.
#[derive(Clone, Debug, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub link: String,
    pub description: String,
    pub reward: Amount,
    pub status: TaskStatus,
}

fn code_matches(submitted: &str, stored: &str) -> bool {
    submitted.trim().eq_ignore_ascii_case(stored.trim())
}

impl Ledger {
    /// Verify a completion code and credit the reward.
    pub fn verify_task(
        &self,
        user_id: &UserId,
        task_id: TaskId,
        code: &str,
    ) -> Result<VerifyOutcome, LedgerError> {
        let mut txn = self.store.write()?;

        let Some(task) = txn.get_task(task_id)? else {
            return Err(LedgerError::NotFound(format!("task {task_id}")));
        };
        if !task.active {
            return Err(LedgerError::NotFound(format!("task {task_id}")));
        }
        let Some(mut user) = txn.get_user(user_id)? else {
            return Err(LedgerError::Unauthorized);
        };

        if user.completed_tasks.contains(&task_id) {
            // Client retry; dropping the transaction leaves state untouched.
            return Ok(VerifyOutcome::AlreadyCompleted);
        }
        if !code_matches(code, &task.code) {
            return Err(LedgerError::InvalidCode);
        }

        user.completed_tasks.insert(task_id);
        user.balance = user.balance.saturating_add(task.reward);

        let mut commission = None;
        if let Some(referrer_id) = user.referrer.clone() {
            if let Some(mut referrer) = txn.get_user(&referrer_id)? {
                let cut = task.reward.commission(self.config.referral_rate_bps);
                if !cut.is_zero() {
                    referrer.balance = referrer.balance.saturating_add(cut);
                    referrer.referral_earnings = referrer.referral_earnings.saturating_add(cut);
                    txn.put_user(&referrer)?;
                    commission = Some(cut);
                }
            }
        }

        txn.put_user(&user)?;
        txn.commit()?;

        info!(
            user = %user.id,
            task = %task_id,
            reward = %task.reward,
            commission = %commission.unwrap_or(Amount::ZERO),
            "task completion credited"
        );
        Ok(VerifyOutcome::Credited {
            reward: task.reward,
            commission,
        })
    }

    /// Active tasks with this user's per-task status.
    pub fn tasks_for(&self, user_id: &UserId) -> Result<Vec<TaskView>, LedgerError> {
        let txn = self.store.read()?;
        let Some(user) = txn.get_user(user_id)? else {
            return Err(LedgerError::Unauthorized);
        };
        let views = txn
            .iter_tasks()?
            .into_iter()
            .filter(|t| t.active)
            .map(|t| {
                let completed = user.completed_tasks.contains(&t.id);
                task_view(t, completed)
            })
            .collect();
        Ok(views)
    }
}

fn task_view(task: TaskRecord, completed: bool) -> TaskView {
    TaskView {
        id: task.id,
        title: task.title,
        link: task.link,
        description: task.description,
        reward: task.reward,
        status: if completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ResolveRequest;
    use crate::testutil;
    use std::sync::{Arc, Barrier};

    #[test]
    fn correct_code_credits_once() {
        let ledger = testutil::ledger();
        let user = testutil::resolve_verified(&ledger, 1);
        let task = testutil::make_task(&ledger, 100, "SECRET");

        let outcome = ledger.verify_task(&user.id, task.id, "SECRET").unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::Credited {
                reward: Amount::from_raw(100),
                commission: None,
            }
        );

        let user = testutil::resolve_verified(&ledger, 1);
        assert_eq!(user.balance, Amount::from_raw(100));
        assert!(user.completed_tasks.contains(&task.id));
    }

    #[test]
    fn code_compare_is_trimmed_and_case_insensitive() {
        let ledger = testutil::ledger();
        let user = testutil::resolve_verified(&ledger, 1);
        let task = testutil::make_task(&ledger, 100, "ABC");

        let outcome = ledger.verify_task(&user.id, task.id, "  abc ").unwrap();
        assert!(matches!(outcome, VerifyOutcome::Credited { .. }));
    }

    #[test]
    fn wrong_code_changes_nothing() {
        let ledger = testutil::ledger();
        let user = testutil::resolve_verified(&ledger, 1);
        let task = testutil::make_task(&ledger, 100, "SECRET");

        assert!(matches!(
            ledger.verify_task(&user.id, task.id, "nope"),
            Err(LedgerError::InvalidCode)
        ));
        let user = testutil::resolve_verified(&ledger, 1);
        assert_eq!(user.balance, Amount::ZERO);
        assert!(user.completed_tasks.is_empty());
    }

    #[test]
    fn retry_is_a_no_op_success() {
        let ledger = testutil::ledger();
        let user = testutil::resolve_verified(&ledger, 1);
        let task = testutil::make_task(&ledger, 100, "SECRET");

        ledger.verify_task(&user.id, task.id, "SECRET").unwrap();
        let outcome = ledger.verify_task(&user.id, task.id, "SECRET").unwrap();
        assert_eq!(outcome, VerifyOutcome::AlreadyCompleted);

        let user = testutil::resolve_verified(&ledger, 1);
        assert_eq!(user.balance, Amount::from_raw(100));
    }

    #[test]
    fn missing_or_inactive_task_is_not_found() {
        let ledger = testutil::ledger();
        let user = testutil::resolve_verified(&ledger, 1);
        assert!(matches!(
            ledger.verify_task(&user.id, TaskId::new(99), "x"),
            Err(LedgerError::NotFound(_))
        ));

        let task = testutil::make_task(&ledger, 100, "SECRET");
        let draft = crate::TaskDraft {
            title: task.title.clone(),
            link: task.link.clone(),
            description: task.description.clone(),
            reward: task.reward,
            code: task.code.clone(),
            active: false,
        };
        ledger.update_task(task.id, draft).unwrap();
        assert!(matches!(
            ledger.verify_task(&user.id, task.id, "SECRET"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn referrer_earns_commission() {
        let ledger = testutil::ledger();
        testutil::resolve_verified(&ledger, 1); // B, the referrer
        let referred = ledger
            .resolve(&ResolveRequest {
                profile: Some(testutil::profile(2, None)),
                anon_id: None,
                referral: Some("1".into()),
                admin_override: None,
            })
            .unwrap();
        let task = testutil::make_task(&ledger, 100, "SECRET"); // 1.00

        let outcome = ledger.verify_task(&referred.id, task.id, "SECRET").unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::Credited {
                reward: Amount::from_raw(100),
                commission: Some(Amount::from_raw(5)), // 0.05 at 5%
            }
        );

        let referrer = testutil::resolve_verified(&ledger, 1);
        assert_eq!(referrer.balance, Amount::from_raw(5));
        assert_eq!(referrer.referral_earnings, Amount::from_raw(5));
        let referred = testutil::resolve_verified(&ledger, 2);
        assert_eq!(referred.balance, Amount::from_raw(100));
    }

    #[test]
    fn concurrent_duplicate_submissions_credit_once() {
        let ledger = Arc::new(testutil::ledger());
        testutil::resolve_verified(&ledger, 1);
        let referred = ledger
            .resolve(&ResolveRequest {
                profile: Some(testutil::profile(2, None)),
                anon_id: None,
                referral: Some("1".into()),
                admin_override: None,
            })
            .unwrap();
        let task = testutil::make_task(&ledger, 100, "SECRET");

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                let user_id = referred.id.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    ledger.verify_task(&user_id, task.id, "SECRET").unwrap()
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let credited = outcomes
            .iter()
            .filter(|o| matches!(o, VerifyOutcome::Credited { .. }))
            .count();
        assert_eq!(credited, 1);

        let referred = testutil::resolve_verified(&ledger, 2);
        assert_eq!(referred.balance, Amount::from_raw(100));
        let referrer = testutil::resolve_verified(&ledger, 1);
        assert_eq!(referrer.balance, Amount::from_raw(5));
        assert_eq!(referrer.referral_earnings, Amount::from_raw(5));
    }

    #[test]
    fn completed_task_is_never_reoffered_as_pending() {
        let ledger = testutil::ledger();
        let user = testutil::resolve_verified(&ledger, 1);
        let task = testutil::make_task(&ledger, 100, "SECRET");

        ledger.verify_task(&user.id, task.id, "SECRET").unwrap();
        let views = ledger.tasks_for(&user.id).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, TaskStatus::Completed);
    }

    #[test]
    fn zero_reward_task_pays_no_commission() {
        let ledger = testutil::ledger();
        testutil::resolve_verified(&ledger, 1);
        let referred = ledger
            .resolve(&ResolveRequest {
                profile: Some(testutil::profile(2, None)),
                anon_id: None,
                referral: Some("1".into()),
                admin_override: None,
            })
            .unwrap();
        let task = testutil::make_task(&ledger, 0, "SECRET");

        let outcome = ledger.verify_task(&referred.id, task.id, "SECRET").unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::Credited {
                reward: Amount::ZERO,
                commission: None,
            }
        );
    }
}
