//! Admin secret verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Comparing HMACs of both values under a fixed key gives a constant-time
/// equality check that also hides the configured secret's length.
const COMPARE_KEY: &[u8] = b"taskpay-admin-secret-v1";

/// Check a supplied admin secret against the configured one in constant time.
///
/// An empty configured secret disables the administrative surface entirely.
pub fn verify_admin_secret(configured: &str, supplied: &str) -> bool {
    if configured.is_empty() {
        return false;
    }

    let mut expected =
        HmacSha256::new_from_slice(COMPARE_KEY).expect("HMAC can take key of any size");
    expected.update(configured.as_bytes());
    let expected = expected.finalize().into_bytes();

    let mut actual =
        HmacSha256::new_from_slice(COMPARE_KEY).expect("HMAC can take key of any size");
    actual.update(supplied.as_bytes());
    actual.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_accepted() {
        assert!(verify_admin_secret("s3cret", "s3cret"));
    }

    #[test]
    fn mismatched_secret_rejected() {
        assert!(!verify_admin_secret("s3cret", "s3cret "));
        assert!(!verify_admin_secret("s3cret", "other"));
        assert!(!verify_admin_secret("s3cret", ""));
    }

    #[test]
    fn empty_configured_secret_disables_admin() {
        assert!(!verify_admin_secret("", ""));
        assert!(!verify_admin_secret("", "anything"));
    }
}
