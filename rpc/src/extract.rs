//! Request identity extraction.
//!
//! The identity carriers ride on every request: `x-telegram-init-data`
//! (signed principal), `x-anon-id` (anonymous identity), and `x-referrer` /
//! `?ref=` (referral candidate). [`Caller`] verifies, resolves, and hands the
//! handler a live user record; [`AdminGate`] checks the admin shared secret.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use tracing::warn;

use taskpay_auth::verify_admin_secret;
use taskpay_ledger::{ResolveRequest, VerifiedProfile};
use taskpay_store::UserRecord;
use taskpay_types::{Timestamp, UserId};

use crate::{AppState, RpcError};

/// The resolved end-user behind a request.
pub struct Caller(pub UserRecord);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = RpcError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let init_data = header_value(parts, "x-telegram-init-data");
        let anon_id = header_value(parts, "x-anon-id");
        let carried_referrer =
            header_value(parts, "x-referrer").or_else(|| query_param(parts, "ref"));

        let (profile, start_param) = match init_data {
            Some(raw) => {
                let principal = state
                    .verifier
                    .verify(&raw, Timestamp::now(), state.auth_max_age_secs)
                    .map_err(|e| {
                        warn!(error = %e, "rejected init data");
                        RpcError::Unauthorized
                    })?;
                let user = principal.user;
                (
                    Some(VerifiedProfile {
                        id: UserId::from_telegram(user.id),
                        first_name: user.first_name,
                        last_name: user.last_name,
                        username: user.username,
                    }),
                    principal.start_param,
                )
            }
            None => (None, None),
        };

        // Carrier priority: the deep-link start parameter wins over the
        // propagated header/query value.
        let referral = start_param.or(carried_referrer);

        // Admins may inspect another user's view; only honored when the
        // admin secret checks out.
        let admin_override = header_value(parts, "x-user-id")
            .or_else(|| query_param(parts, "id"))
            .filter(|_| {
                let supplied = header_value(parts, "x-admin-secret").unwrap_or_default();
                verify_admin_secret(&state.admin_secret, &supplied)
            })
            .map(UserId::new);

        let record = state.ledger.resolve(&ResolveRequest {
            profile,
            anon_id: anon_id.map(UserId::new),
            referral,
            admin_override,
        })?;
        Ok(Caller(record))
    }
}

/// Admin-surface gate: requests must carry the configured shared secret.
pub struct AdminGate;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminGate {
    type Rejection = RpcError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let supplied = header_value(parts, "x-admin-secret").unwrap_or_default();
        if !verify_admin_secret(&state.admin_secret, &supplied) {
            return Err(RpcError::Unauthorized);
        }
        Ok(AdminGate)
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn query_param(parts: &Parts, name: &str) -> Option<String> {
    let query = parts.uri.query()?;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == name {
            let decoded = urlencoding::decode(value).unwrap_or_default().into_owned();
            if !decoded.is_empty() {
                return Some(decoded);
            }
        }
    }
    None
}
