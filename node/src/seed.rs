//! Demo-data bootstrap.
//!
//! Seeds a handful of demo tasks on first start so a fresh deployment has
//! something to show. Guarded by a meta flag; strictly a startup concern,
//! never part of steady-state operation.

use std::sync::Arc;
use tracing::info;

use taskpay_store::{Store, TaskRecord};
use taskpay_types::{Amount, Timestamp};

use crate::NodeError;

const SEEDED_FLAG: &str = "demo_tasks_seeded";

/// Title, link, description, reward in cents, code.
const DEMO_TASKS: &[(&str, &str, &str, u64, &str)] = &[
    (
        "Join our channel",
        "https://t.me/taskpay_news",
        "Join the announcement channel and grab the code from the pinned post.",
        50,
        "WELCOME",
    ),
    (
        "Follow on X",
        "https://x.com/taskpay",
        "Follow the account; the code is in the bio.",
        75,
        "BIRDSEED",
    ),
    (
        "Visit the landing page",
        "https://taskpay.example/start",
        "Read the intro page to find the code at the bottom.",
        100,
        "LANDED",
    ),
];

/// Insert the demo tasks exactly once per store.
pub fn seed_demo_tasks(store: &Arc<dyn Store>) -> Result<(), NodeError> {
    let mut txn = store.write()?;
    if txn.get_meta(SEEDED_FLAG)?.is_some() {
        return Ok(());
    }
    for (title, link, description, reward, code) in DEMO_TASKS {
        let id = txn.next_task_id()?;
        txn.put_task(&TaskRecord {
            id,
            title: (*title).to_owned(),
            link: (*link).to_owned(),
            description: (*description).to_owned(),
            reward: Amount::from_raw(*reward),
            code: (*code).to_owned(),
            active: true,
            created_at: Timestamp::now(),
        })?;
    }
    txn.put_meta(SEEDED_FLAG, b"1")?;
    txn.commit()?;
    info!(count = DEMO_TASKS.len(), "seeded demo tasks");
    Ok(())
}
