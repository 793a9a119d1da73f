//! Referral attribution.
//!
//! A referral candidate can arrive as a raw user id, an `@handle`, or a
//! transport-encoded structured payload. Attribution binds a user to their
//! referrer at most once and is strictly best-effort: an unresolvable
//! candidate is ignored, never an error.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use tracing::{debug, info};

use taskpay_store::{ReadTxn, StoreError, WriteTxn, UserRecord};
use taskpay_types::{Amount, UserId};

use crate::{Ledger, LedgerError};

/// A decoded referral candidate, normalized and ready for lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefCandidate {
    /// A bare user id (external platform id or anonymous `web_` id).
    RawId(UserId),
    /// A username, resolved through the handle index.
    Handle(String),
    /// A base64 carrier wrapping one of the other two forms.
    EncodedPayload(Box<RefCandidate>),
}

impl RefCandidate {
    /// Decode and normalize a raw carrier value.
    ///
    /// Returns `None` for values that cannot name a user (empty strings and
    /// the stringified nulls some clients replay from persisted storage).
    pub fn decode(raw: &str) -> Option<Self> {
        Self::decode_step(raw, true)
    }

    fn decode_step(raw: &str, allow_encoded: bool) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
            return None;
        }
        let stripped = trimmed.strip_prefix("ref_").unwrap_or(trimmed);

        if let Some(handle) = stripped.strip_prefix('@') {
            let handle = handle.trim();
            if handle.is_empty() {
                return None;
            }
            return Some(Self::Handle(handle.to_ascii_lowercase()));
        }
        if stripped.starts_with(UserId::ANON_PREFIX)
            || stripped.chars().all(|c| c.is_ascii_digit())
        {
            return Some(Self::RawId(UserId::new(stripped)));
        }
        if allow_encoded {
            if let Some(inner) = decode_payload(stripped) {
                // One level of wrapping only.
                return Self::decode_step(&inner, false)
                    .map(|c| Self::EncodedPayload(Box::new(c)));
            }
        }
        Some(Self::Handle(stripped.to_ascii_lowercase()))
    }

    fn resolve(&self, txn: &dyn ReadTxn) -> Result<Option<UserId>, StoreError> {
        match self {
            Self::RawId(id) => Ok(txn.get_user(id)?.map(|u| u.id)),
            Self::Handle(handle) => txn.lookup_handle(handle),
            Self::EncodedPayload(inner) => inner.resolve(txn),
        }
    }
}

/// Unwrap a base64 carrier: either a JSON object with a `ref`/`id` field or a
/// bare id/handle string.
fn decode_payload(raw: &str) -> Option<String> {
    let bytes = STANDARD
        .decode(raw)
        .or_else(|_| URL_SAFE_NO_PAD.decode(raw))
        .ok()?;
    let text = String::from_utf8(bytes).ok()?;
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&text) {
        return match map.get("ref").or_else(|| map.get("id"))? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
    }
    // A decoded blob that does not look like an id was never a carrier.
    let looks_like_id = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@');
    looks_like_id.then_some(text)
}

/// A referred user, as shown in the referrer's overview.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ReferredUser {
    pub id: UserId,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// The caller's referral standing.
#[derive(Clone, Debug)]
pub struct ReferralOverview {
    pub referred: Vec<ReferredUser>,
    pub earnings: Amount,
}

impl Ledger {
    /// Bind a referral candidate to `record` if it has none yet.
    ///
    /// Runs inside the resolving write transaction. Lookup failures degrade
    /// to "no referrer attached"; only write failures propagate.
    pub(crate) fn attribute_referral(
        &self,
        txn: &mut dyn WriteTxn,
        mut record: UserRecord,
        raw: Option<&str>,
    ) -> Result<UserRecord, LedgerError> {
        if record.referrer.is_some() {
            return Ok(record);
        }
        let Some(raw) = raw else {
            return Ok(record);
        };
        let Some(candidate) = RefCandidate::decode(raw) else {
            return Ok(record);
        };
        let referrer_id = match candidate.resolve(txn.as_read()) {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!(user = %record.id, candidate = raw, "referral candidate did not resolve");
                return Ok(record);
            }
            Err(e) => {
                debug!(user = %record.id, error = %e, "referral lookup failed");
                return Ok(record);
            }
        };
        if referrer_id == record.id {
            debug!(user = %record.id, "ignoring self-referral");
            return Ok(record);
        }
        let Some(mut referrer) = txn.get_user(&referrer_id)? else {
            return Ok(record);
        };

        record.referrer = Some(referrer_id.clone());
        referrer.referrals.insert(record.id.clone());
        txn.put_user(&referrer)?;
        txn.put_user(&record)?;
        info!(user = %record.id, referrer = %referrer_id, "referral attributed");
        Ok(record)
    }

    /// The caller's referral overview: referred users and lifetime earnings.
    pub fn referral_overview(&self, user_id: &UserId) -> Result<ReferralOverview, LedgerError> {
        let txn = self.store.read()?;
        let Some(user) = txn.get_user(user_id)? else {
            return Err(LedgerError::Unauthorized);
        };
        let mut referred = Vec::with_capacity(user.referrals.len());
        for id in &user.referrals {
            if let Some(r) = txn.get_user(id)? {
                referred.push(ReferredUser {
                    id: r.id,
                    first_name: r.first_name,
                    username: r.username,
                });
            }
        }
        Ok(ReferralOverview {
            referred,
            earnings: user.referral_earnings,
        })
    }
}
