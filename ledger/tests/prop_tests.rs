use proptest::prelude::*;
use std::sync::Arc;

use taskpay_ledger::{Ledger, LedgerConfig, ResolveRequest, TaskDraft, VerifiedProfile};
use taskpay_store::MemoryStore;
use taskpay_types::{Amount, TaskId, UserId, WithdrawalStatus};

fn ledger() -> Ledger {
    Ledger::new(Arc::new(MemoryStore::new()), LedgerConfig::default())
}

fn resolve(ledger: &Ledger, id: i64, referral: Option<String>) {
    ledger
        .resolve(&ResolveRequest {
            profile: Some(VerifiedProfile {
                id: UserId::from_telegram(id),
                first_name: None,
                last_name: None,
                username: None,
            }),
            anon_id: None,
            referral,
            admin_override: None,
        })
        .expect("resolve");
}

fn make_task(ledger: &Ledger, reward_raw: u64) -> TaskId {
    ledger
        .create_task(TaskDraft {
            title: "t".into(),
            link: "https://example.com".into(),
            description: String::new(),
            reward: Amount::from_raw(reward_raw),
            code: "CODE".into(),
            active: true,
        })
        .expect("create task")
        .id
}

/// One randomized user action.
#[derive(Clone, Debug)]
enum Op {
    Verify { task: usize, user: i64 },
    Withdraw { user: i64, raw: u64 },
    AdminTransition { index: usize, status: WithdrawalStatus },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, 1i64..5).prop_map(|(task, user)| Op::Verify { task, user }),
        (1i64..5, 1u64..2_000).prop_map(|(user, raw)| Op::Withdraw { user, raw }),
        (
            0usize..6,
            prop_oneof![
                Just(WithdrawalStatus::Approved),
                Just(WithdrawalStatus::Rejected),
                Just(WithdrawalStatus::Completed),
            ]
        )
            .prop_map(|(index, status)| Op::AdminTransition { index, status }),
    ]
}

proptest! {
    /// Balances never go negative and the referrer binding never changes,
    /// whatever interleaving of operations runs.
    #[test]
    fn ledger_invariants_hold(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let ledger = ledger();
        // Users 1..5; users 2..5 are referred by user 1 on first contact.
        resolve(&ledger, 1, None);
        for id in 2..5 {
            resolve(&ledger, id, Some("1".to_string()));
        }
        let tasks: Vec<TaskId> = (0..4).map(|i| make_task(&ledger, 100 * (i + 1))).collect();

        let mut withdrawal_ids = Vec::new();
        for op in ops {
            match op {
                Op::Verify { task, user } => {
                    let _ = ledger.verify_task(
                        &UserId::from_telegram(user),
                        tasks[task],
                        "code",
                    );
                }
                Op::Withdraw { user, raw } => {
                    if let Ok(record) = ledger.request_withdrawal(
                        &UserId::from_telegram(user),
                        Amount::from_raw(raw),
                        "ton",
                        "x",
                    ) {
                        withdrawal_ids.push(record.id);
                    }
                }
                Op::AdminTransition { index, status } => {
                    if let Some(&id) = withdrawal_ids.get(index) {
                        let _ = ledger.set_withdrawal_status(id, status);
                    }
                }
            }
        }

        for user in ledger.list_users().unwrap() {
            // Amount is unsigned, so negativity shows up as an absurdly large
            // balance after an underflow; bound it by total possible credits.
            prop_assert!(user.balance.raw() < 1_000_000);
            if !user.id.is_anonymous() && user.id != UserId::from_telegram(1) {
                prop_assert_eq!(user.referrer.clone(), Some(UserId::from_telegram(1)));
            }
        }

        // Money conservation: liability plus non-rejected withdrawal debits
        // equals rewards paid plus commissions.
        let stats = ledger.stats().unwrap();
        let mut debits = Amount::ZERO;
        for w in ledger.list_withdrawals().unwrap() {
            if w.status != WithdrawalStatus::Rejected {
                debits = debits.saturating_add(w.amount);
            }
        }
        let mut credited = Amount::ZERO;
        for user in ledger.list_users().unwrap() {
            for task_id in &user.completed_tasks {
                let reward = ledger
                    .list_tasks()
                    .unwrap()
                    .into_iter()
                    .find(|t| t.id == *task_id)
                    .map(|t| t.reward)
                    .unwrap_or(Amount::ZERO);
                credited = credited.saturating_add(reward);
                if user.referrer.is_some() {
                    credited = credited.saturating_add(reward.commission(500));
                }
            }
        }
        prop_assert_eq!(stats.total_balance.saturating_add(debits), credited);
    }

    /// A referrer binding set in round one survives any later candidate.
    #[test]
    fn referrer_is_immutable(candidates in proptest::collection::vec("[a-z0-9_@]{1,12}", 1..10)) {
        let ledger = ledger();
        resolve(&ledger, 1, None);
        resolve(&ledger, 7, None);
        resolve(&ledger, 2, Some("1".to_string()));

        for candidate in candidates {
            resolve(&ledger, 2, Some(candidate));
        }
        // "7" is a resolvable competing candidate; it must also lose.
        resolve(&ledger, 2, Some("7".to_string()));

        let users = ledger.list_users().unwrap();
        let user2 = users
            .iter()
            .find(|u| u.id == UserId::from_telegram(2))
            .unwrap();
        prop_assert_eq!(user2.referrer.clone(), Some(UserId::from_telegram(1)));
    }
}
