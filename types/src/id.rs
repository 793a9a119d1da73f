//! Identifier newtypes for users, tasks, and withdrawals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user identifier.
///
/// Verified users carry their external platform id as a decimal string;
/// anonymous users carry a client-generated id prefixed with `web_`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// The prefix reserved for anonymous (unverified) identities.
    pub const ANON_PREFIX: &'static str = "web_";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build the id for a verified external platform account.
    pub fn from_telegram(id: i64) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id belongs to the anonymous (client-minted) id space.
    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with(Self::ANON_PREFIX)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A task identifier, allocated from a store-level sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A withdrawal identifier, allocated from a store-level sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WithdrawalId(u64);

impl WithdrawalId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WithdrawalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
