//! Status enums for withdrawals and per-user task views.

use serde::{Deserialize, Serialize};

/// The state of a withdrawal request.
///
/// Only forward transitions are allowed: a pending request is approved or
/// rejected by an administrator, and an approved request is later marked
/// completed once paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    /// Requested by the user; balance already debited.
    Pending,
    /// Accepted by an administrator; awaiting payout.
    Approved,
    /// Paid out.
    Completed,
    /// Declined by an administrator; the debited amount is refunded.
    Rejected,
}

impl WithdrawalStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a client-supplied status value; anything outside the allowed set
    /// is rejected with `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Per-user task state as shown in the task list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not yet completed by this user.
    Pending,
    /// Completed and credited.
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_approved_or_rejected() {
        assert!(WithdrawalStatus::Pending.can_transition_to(WithdrawalStatus::Approved));
        assert!(WithdrawalStatus::Pending.can_transition_to(WithdrawalStatus::Rejected));
    }

    #[test]
    fn approved_can_only_complete() {
        assert!(WithdrawalStatus::Approved.can_transition_to(WithdrawalStatus::Completed));
        assert!(!WithdrawalStatus::Approved.can_transition_to(WithdrawalStatus::Rejected));
        assert!(!WithdrawalStatus::Approved.can_transition_to(WithdrawalStatus::Pending));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for next in [
            WithdrawalStatus::Pending,
            WithdrawalStatus::Approved,
            WithdrawalStatus::Completed,
            WithdrawalStatus::Rejected,
        ] {
            assert!(!WithdrawalStatus::Completed.can_transition_to(next));
            assert!(!WithdrawalStatus::Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert_eq!(WithdrawalStatus::parse("approved"), Some(WithdrawalStatus::Approved));
        assert_eq!(WithdrawalStatus::parse(" Pending "), Some(WithdrawalStatus::Pending));
        assert_eq!(WithdrawalStatus::parse("cancelled"), None);
        assert_eq!(WithdrawalStatus::parse(""), None);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&WithdrawalStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
