//! Principal verification for the TaskPay API.
//!
//! Requests arrive carrying an opaque signed payload (the mini-app "init
//! data") produced by the chat platform. This crate validates the payload's
//! keyed-hash signature against the deployment's bot token and extracts the
//! embedded user profile. It also provides the constant-time admin secret
//! comparison used by the administrative surface.

pub mod admin;
pub mod error;
pub mod init_data;

pub use admin::verify_admin_secret;
pub use error::AuthError;
pub use init_data::{InitDataVerifier, Principal, TelegramUser};
