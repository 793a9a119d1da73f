//! Axum-based HTTP JSON API.
//!
//! Every request re-derives its identity from the carriers it brings — the
//! signed init-data header, the anonymous-id header, and the referral
//! header/query — so the server keeps no session state beyond the persistent
//! store. The administrative surface is gated by a separate shared secret.

pub mod admin;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use metrics::RpcMetrics;
pub use server::{router, AppState, RpcServer};
