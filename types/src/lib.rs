//! Fundamental types for the TaskPay service.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: user/task/withdrawal identifiers, monetary amounts, timestamps,
//! and status enums.

pub mod amount;
pub mod id;
pub mod state;
pub mod time;

pub use amount::Amount;
pub use id::{TaskId, UserId, WithdrawalId};
pub use state::{TaskStatus, WithdrawalStatus};
pub use time::Timestamp;
