//! Prometheus metrics for the RPC surface.
//!
//! The [`RpcMetrics`] struct owns a dedicated [`Registry`] that the
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{register_int_counter_with_registry, IntCounter, Opts, Registry};

/// Counters covering the ledger-affecting operations.
pub struct RpcMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Total task completions credited.
    pub tasks_verified: IntCounter,
    /// Total reward value credited to users, in cents.
    pub rewards_credited_cents: IntCounter,
    /// Total commission value credited to referrers, in cents.
    pub commissions_credited_cents: IntCounter,
    /// Total withdrawal requests accepted.
    pub withdrawals_requested: IntCounter,
}

impl RpcMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let tasks_verified = register_int_counter_with_registry!(
            Opts::new("taskpay_tasks_verified_total", "Task completions credited"),
            registry
        )
        .expect("failed to register tasks_verified counter");

        let rewards_credited_cents = register_int_counter_with_registry!(
            Opts::new(
                "taskpay_rewards_credited_cents_total",
                "Reward value credited to users, in cents"
            ),
            registry
        )
        .expect("failed to register rewards_credited_cents counter");

        let commissions_credited_cents = register_int_counter_with_registry!(
            Opts::new(
                "taskpay_commissions_credited_cents_total",
                "Commission value credited to referrers, in cents"
            ),
            registry
        )
        .expect("failed to register commissions_credited_cents counter");

        let withdrawals_requested = register_int_counter_with_registry!(
            Opts::new(
                "taskpay_withdrawals_requested_total",
                "Withdrawal requests accepted"
            ),
            registry
        )
        .expect("failed to register withdrawals_requested counter");

        Self {
            registry,
            tasks_verified,
            rewards_credited_cents,
            commissions_credited_cents,
            withdrawals_requested,
        }
    }
}

impl Default for RpcMetrics {
    fn default() -> Self {
        Self::new()
    }
}
