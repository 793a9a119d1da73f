//! Identity resolution.
//!
//! Maps a request — verified principal, anonymous browser identity, or
//! neither — to exactly one durable user record, and merges pre-auth
//! anonymous history into a newly verified identity. The whole resolution,
//! merge included, runs inside one write transaction.

use taskpay_store::{user::UserRecord, WriteTxn};
use taskpay_types::{Timestamp, UserId};
use tracing::info;

use crate::{Ledger, LedgerError};

/// A verified external profile, as produced by the principal verifier.
///
/// The id is authoritative; the display fields refresh the stored record on
/// every authenticated contact.
#[derive(Clone, Debug)]
pub struct VerifiedProfile {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// The identity carriers of one request.
#[derive(Clone, Debug, Default)]
pub struct ResolveRequest {
    pub profile: Option<VerifiedProfile>,
    pub anon_id: Option<UserId>,
    /// Raw referral candidate, decoded by the attribution engine.
    pub referral: Option<String>,
    /// Administrative override: inspect an existing record as-is. Callers
    /// must gate this behind the admin secret.
    pub admin_override: Option<UserId>,
}

impl Ledger {
    /// Resolve a request to its user record, creating, refreshing, or merging
    /// as needed, then opportunistically attribute a referral.
    ///
    /// An admin override is a pure lookup: no creation, no profile refresh,
    /// no referral attribution.
    pub fn resolve(&self, req: &ResolveRequest) -> Result<UserRecord, LedgerError> {
        if let Some(override_id) = &req.admin_override {
            let txn = self.store.read()?;
            return txn
                .get_user(override_id)?
                .ok_or_else(|| LedgerError::NotFound(format!("user {override_id}")));
        }

        let mut txn = self.store.write()?;
        let record = match (&req.profile, &req.anon_id) {
            (Some(profile), anon) => resolve_verified(txn.as_mut(), profile, anon.as_ref())?,
            (None, Some(anon)) if self.config.allow_anonymous => {
                resolve_anonymous(txn.as_mut(), anon)?
            }
            _ => return Err(LedgerError::Unauthorized),
        };
        let record = self.attribute_referral(txn.as_mut(), record, req.referral.as_deref())?;
        txn.commit()?;
        Ok(record)
    }
}

fn resolve_verified(
    txn: &mut dyn WriteTxn,
    profile: &VerifiedProfile,
    anon: Option<&UserId>,
) -> Result<UserRecord, LedgerError> {
    let mut record = match txn.get_user(&profile.id)? {
        Some(existing) => existing,
        None => {
            info!(user = %profile.id, "creating user record");
            UserRecord::new(profile.id.clone(), Timestamp::now())
        }
    };

    refresh_profile(txn, &mut record, profile)?;

    if let Some(anon_id) = anon {
        if anon_id.is_anonymous() {
            if let Some(anon_record) = txn.get_user(anon_id)? {
                merge_into(txn, &mut record, anon_record)?;
            }
        }
    }

    txn.put_user(&record)?;
    Ok(record)
}

fn resolve_anonymous(txn: &mut dyn WriteTxn, anon_id: &UserId) -> Result<UserRecord, LedgerError> {
    // Client-minted ids must stay inside the anonymous id space; a bare
    // external id here would let a caller impersonate a verified user.
    if !anon_id.is_anonymous() {
        return Err(LedgerError::Unauthorized);
    }
    match txn.get_user(anon_id)? {
        Some(existing) => Ok(existing),
        None => {
            info!(user = %anon_id, "creating anonymous user record");
            let record = UserRecord::new(anon_id.clone(), Timestamp::now());
            txn.put_user(&record)?;
            Ok(record)
        }
    }
}

/// Refresh display fields from the verified source and keep the handle index
/// in sync. Monetary fields are never touched here.
fn refresh_profile(
    txn: &mut dyn WriteTxn,
    record: &mut UserRecord,
    profile: &VerifiedProfile,
) -> Result<(), LedgerError> {
    record.first_name = profile.first_name.clone();
    record.last_name = profile.last_name.clone();

    let new_handle = profile.username.as_ref().map(|u| u.to_ascii_lowercase());
    let old_handle = record.username.as_ref().map(|u| u.to_ascii_lowercase());
    if old_handle != new_handle {
        if let Some(old) = old_handle {
            txn.delete_handle(&old)?;
        }
    }
    if let Some(handle) = &new_handle {
        txn.put_handle(handle, &record.id)?;
    }
    record.username = profile.username.clone();
    Ok(())
}

/// Absorb an anonymous record into the verified `primary` and delete it.
///
/// Keyed by (anon id, primary id), this is idempotent end to end: a second
/// run finds no anonymous record and never reaches this function.
fn merge_into(
    txn: &mut dyn WriteTxn,
    primary: &mut UserRecord,
    anon: UserRecord,
) -> Result<(), LedgerError> {
    let anon_id = anon.id.clone();
    info!(from = %anon_id, into = %primary.id, "merging anonymous history");

    // Repoint referrer edges and referral-set membership before the
    // anonymous record disappears.
    for mut other in txn.iter_users()? {
        if other.id == anon_id || other.id == primary.id {
            continue;
        }
        let mut changed = false;
        if other.referrer.as_ref() == Some(&anon_id) {
            other.referrer = Some(primary.id.clone());
            changed = true;
        }
        if other.referrals.remove(&anon_id) {
            other.referrals.insert(primary.id.clone());
            changed = true;
        }
        if changed {
            txn.put_user(&other)?;
        }
    }

    // Withdrawal history follows the surviving identity.
    for mut withdrawal in txn.iter_withdrawals_for(&anon_id)? {
        withdrawal.user = primary.id.clone();
        txn.put_withdrawal(&withdrawal)?;
    }

    if let Some(handle) = anon.username.as_ref().map(|u| u.to_ascii_lowercase()) {
        if txn.lookup_handle(&handle)? == Some(anon_id.clone()) {
            txn.delete_handle(&handle)?;
        }
    }

    *primary = merge_records(primary.clone(), anon);
    txn.delete_user(&anon_id)?;
    Ok(())
}

/// Combine two records into one: numeric fields sum, sets union, `referrer`
/// keeps the primary's binding (the anonymous one fills in only if unset).
/// Pure over its inputs; the transactional driver above handles the edges
/// held by other records.
pub(crate) fn merge_records(mut primary: UserRecord, anon: UserRecord) -> UserRecord {
    primary.balance = primary.balance.saturating_add(anon.balance);
    primary.referral_earnings = primary.referral_earnings.saturating_add(anon.referral_earnings);
    primary.referrals.extend(anon.referrals);
    primary.referrals.remove(&primary.id);
    primary.referrals.remove(&anon.id);
    primary.completed_tasks.extend(anon.completed_tasks);
    if primary.referrer.is_none() {
        primary.referrer = anon.referrer;
    }
    // A binding that now points at the merged identity itself is dropped.
    if primary
        .referrer
        .as_ref()
        .is_some_and(|r| *r == primary.id || *r == anon.id)
    {
        primary.referrer = None;
    }
    primary
}
