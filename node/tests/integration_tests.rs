//! Integration tests exercising the full pipeline the way `node.rs` wires
//! it: identity resolution → referral attribution → reward crediting →
//! withdrawal lifecycle, all against real LMDB persistence.

use std::sync::Arc;

use taskpay_ledger::{Ledger, LedgerConfig, ResolveRequest, TaskDraft, VerifiedProfile, VerifyOutcome};
use taskpay_store::Store;
use taskpay_store_lmdb::LmdbStore;
use taskpay_types::{Amount, UserId, WithdrawalStatus};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn temp_ledger() -> (tempfile::TempDir, Ledger) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store: Arc<dyn Store> = Arc::new(
        LmdbStore::open(dir.path(), 32 * 1024 * 1024).expect("open env"),
    );
    (dir, Ledger::new(store, LedgerConfig::default()))
}

fn profile(id: i64, username: Option<&str>) -> VerifiedProfile {
    VerifiedProfile {
        id: UserId::from_telegram(id),
        first_name: Some(format!("user{id}")),
        last_name: None,
        username: username.map(str::to_owned),
    }
}

fn resolve_with(ledger: &Ledger, id: i64, referral: Option<&str>) -> taskpay_store::UserRecord {
    ledger
        .resolve(&ResolveRequest {
            profile: Some(profile(id, None)),
            anon_id: None,
            referral: referral.map(str::to_owned),
            admin_override: None,
        })
        .expect("resolve")
}

fn make_task(ledger: &Ledger, reward_raw: u64, code: &str) -> taskpay_store::TaskRecord {
    ledger
        .create_task(TaskDraft {
            title: "Join the channel".into(),
            link: "https://example.com".into(),
            description: String::new(),
            reward: Amount::from_raw(reward_raw),
            code: code.into(),
            active: true,
        })
        .expect("create task")
}

// ---------------------------------------------------------------------------
// 1. Referral commission flow, end to end on LMDB
// ---------------------------------------------------------------------------

#[test]
fn referred_completion_pays_commission_through_lmdb() {
    let (_dir, ledger) = temp_ledger();

    resolve_with(&ledger, 1, None); // B, the referrer
    let a = resolve_with(&ledger, 2, Some("1")); // A, referred by B
    let task = make_task(&ledger, 100, "SECRET"); // 1.00 at 5%

    let outcome = ledger.verify_task(&a.id, task.id, "secret").unwrap();
    assert_eq!(
        outcome,
        VerifyOutcome::Credited {
            reward: Amount::from_raw(100),
            commission: Some(Amount::from_raw(5)),
        }
    );

    let b = resolve_with(&ledger, 1, None);
    assert_eq!(b.balance, Amount::from_raw(5));
    assert_eq!(b.referral_earnings, Amount::from_raw(5));
    let a = resolve_with(&ledger, 2, None);
    assert_eq!(a.balance, Amount::from_raw(100));
}

// ---------------------------------------------------------------------------
// 2. Anonymous history merge persists
// ---------------------------------------------------------------------------

#[test]
fn anonymous_merge_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");

    {
        let store: Arc<dyn Store> =
            Arc::new(LmdbStore::open(dir.path(), 32 * 1024 * 1024).unwrap());
        let ledger = Ledger::new(store, LedgerConfig::default());

        let anon = ledger
            .resolve(&ResolveRequest {
                profile: None,
                anon_id: Some(UserId::new("web_abc")),
                referral: None,
                admin_override: None,
            })
            .unwrap();
        let task = make_task(&ledger, 200, "CODE");
        ledger.verify_task(&anon.id, task.id, "CODE").unwrap();

        let merged = ledger
            .resolve(&ResolveRequest {
                profile: Some(profile(42, None)),
                anon_id: Some(UserId::new("web_abc")),
                referral: None,
                admin_override: None,
            })
            .unwrap();
        assert_eq!(merged.balance, Amount::from_raw(200));
    }

    // Reopen the environment; the merge must be durable and final.
    let store: Arc<dyn Store> = Arc::new(LmdbStore::open(dir.path(), 32 * 1024 * 1024).unwrap());
    let ledger = Ledger::new(store, LedgerConfig::default());
    let user = resolve_with(&ledger, 42, None);
    assert_eq!(user.balance, Amount::from_raw(200));

    let again = ledger
        .resolve(&ResolveRequest {
            profile: Some(profile(42, None)),
            anon_id: Some(UserId::new("web_abc")),
            referral: None,
            admin_override: None,
        })
        .unwrap();
    assert_eq!(again.balance, Amount::from_raw(200));
}

// ---------------------------------------------------------------------------
// 3. Concurrent duplicate verification over one LMDB environment
// ---------------------------------------------------------------------------

#[test]
fn concurrent_verification_credits_once_on_lmdb() {
    let (_dir, ledger) = temp_ledger();
    let user = resolve_with(&ledger, 7, None);
    let task = make_task(&ledger, 300, "RACE");

    let ledger = Arc::new(ledger);
    let threads = 4;
    let barrier = Arc::new(std::sync::Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            let user_id = user.id.clone();
            std::thread::spawn(move || {
                barrier.wait();
                ledger.verify_task(&user_id, task.id, "RACE").unwrap()
            })
        })
        .collect();

    let credited = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| matches!(o, VerifyOutcome::Credited { .. }))
        .count();
    assert_eq!(credited, 1);

    let user = resolve_with(&ledger, 7, None);
    assert_eq!(user.balance, Amount::from_raw(300));
}

// ---------------------------------------------------------------------------
// 4. Withdrawal lifecycle including the rejection refund
// ---------------------------------------------------------------------------

#[test]
fn withdrawal_lifecycle_on_lmdb() {
    let (_dir, ledger) = temp_ledger();
    let user = resolve_with(&ledger, 9, None);
    let task = make_task(&ledger, 1000, "FUND");
    ledger.verify_task(&user.id, task.id, "FUND").unwrap();

    let first = ledger
        .request_withdrawal(&user.id, Amount::from_raw(400), "ton", "UQaddr")
        .unwrap();
    let second = ledger
        .request_withdrawal(&user.id, Amount::from_raw(300), "card", "1234")
        .unwrap();

    // Over-balance request fails and changes nothing.
    assert!(ledger
        .request_withdrawal(&user.id, Amount::from_raw(900), "ton", "x")
        .is_err());

    let approved = ledger
        .set_withdrawal_status(first.id, WithdrawalStatus::Approved)
        .unwrap();
    assert_eq!(approved.status, WithdrawalStatus::Approved);
    ledger
        .set_withdrawal_status(first.id, WithdrawalStatus::Completed)
        .unwrap();

    // Rejection refunds in the same transaction.
    ledger
        .set_withdrawal_status(second.id, WithdrawalStatus::Rejected)
        .unwrap();
    let user = resolve_with(&ledger, 9, None);
    assert_eq!(user.balance, Amount::from_raw(600)); // 1000 - 400

    let history = ledger.withdrawals_for(&user.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id); // newest first
}

// ---------------------------------------------------------------------------
// 5. Handle-based referral resolution through the persistent index
// ---------------------------------------------------------------------------

#[test]
fn handle_referral_resolves_through_index() {
    let (_dir, ledger) = temp_ledger();
    ledger
        .resolve(&ResolveRequest {
            profile: Some(profile(1, Some("Ada"))),
            anon_id: None,
            referral: None,
            admin_override: None,
        })
        .unwrap();

    let referred = resolve_with(&ledger, 2, Some("@Ada"));
    assert_eq!(referred.referrer, Some(UserId::from_telegram(1)));

    // A later, different candidate never rebinds.
    resolve_with(&ledger, 3, None);
    let referred = resolve_with(&ledger, 2, Some("3"));
    assert_eq!(referred.referrer, Some(UserId::from_telegram(1)));
}
