//! Signed init-data parsing and verification.
//!
//! The payload is a query-string of key/value fields plus a `hash` signature.
//! Verification rebuilds the canonical check string (fields sorted by key,
//! joined as `key=value` lines) and compares an HMAC-SHA256 over it against
//! the supplied signature. The HMAC key is itself derived by keying HMAC with
//! the literal domain-separation string `WebAppData` over the bot token.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use taskpay_types::Timestamp;

use crate::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// The domain-separation string fixed by the platform's signing scheme.
const KEY_DOMAIN: &[u8] = b"WebAppData";

/// The embedded user profile carried inside the `user` field.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// A successfully verified caller identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Principal {
    pub user: TelegramUser,
    /// The deep-link start parameter, if the mini-app was opened through one.
    pub start_param: Option<String>,
}

/// Verifies signed init-data payloads for one deployment.
///
/// The derived secret is computed once from the bot token at construction.
pub struct InitDataVerifier {
    secret: [u8; 32],
}

impl InitDataVerifier {
    pub fn new(bot_token: &str) -> Self {
        let mut mac =
            HmacSha256::new_from_slice(KEY_DOMAIN).expect("HMAC can take key of any size");
        mac.update(bot_token.as_bytes());
        Self {
            secret: mac.finalize().into_bytes().into(),
        }
    }

    /// Verify a raw init-data string and extract the caller's profile.
    ///
    /// `max_age_secs` rejects stale payloads by their `auth_date`; 0 disables
    /// the freshness check. No side effects on failure.
    pub fn verify(
        &self,
        raw: &str,
        now: Timestamp,
        max_age_secs: u64,
    ) -> Result<Principal, AuthError> {
        let mut fields = parse_init_data(raw);
        let supplied = fields.remove("hash").ok_or(AuthError::MissingSignature)?;
        let supplied = hex::decode(supplied).map_err(|_| AuthError::MalformedSignature)?;

        let check_string = fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(check_string.as_bytes());
        // Constant-time comparison of the full tag.
        mac.verify_slice(&supplied)
            .map_err(|_| AuthError::BadSignature)?;

        if max_age_secs > 0 {
            let auth_date = fields
                .get("auth_date")
                .and_then(|v| v.parse::<u64>().ok())
                .ok_or(AuthError::MalformedField("auth_date"))?;
            if Timestamp::new(auth_date).has_expired(max_age_secs, now) {
                return Err(AuthError::Expired);
            }
        }

        let user_json = fields.get("user").ok_or(AuthError::MalformedField("user"))?;
        let user: TelegramUser =
            serde_json::from_str(user_json).map_err(|_| AuthError::MalformedField("user"))?;

        let start_param = fields
            .get("start_param")
            .filter(|v| !v.is_empty())
            .cloned();

        Ok(Principal { user, start_param })
    }
}

/// Parse the query-string encoding into percent-decoded key/value fields.
///
/// A `BTreeMap` keeps the fields sorted by key, which is exactly the order
/// the check string requires.
pub fn parse_init_data(raw: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(key).unwrap_or_default().into_owned();
        let value = urlencoding::decode(value).unwrap_or_default().into_owned();
        if key.is_empty() {
            continue;
        }
        fields.insert(key, value);
    }
    fields
}
