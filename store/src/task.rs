//! Task record.

use serde::{Deserialize, Serialize};
use taskpay_types::{Amount, TaskId, Timestamp};

/// A promotional task users can complete for a reward.
///
/// `code` is the secret completion token and must never be exposed through
/// the end-user surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    /// Destination the user must visit to complete the task.
    pub link: String,
    pub description: String,
    pub reward: Amount,
    /// Secret verification token, compared trimmed and case-insensitively.
    pub code: String,
    /// Inactive tasks are hidden from users and cannot be verified.
    pub active: bool,
    pub created_at: Timestamp,
}
