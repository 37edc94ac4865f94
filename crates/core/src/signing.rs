//! Webhook HMAC signing and verification.
//!
//! Providers that deliver completion notices out-of-band sign the raw
//! request body with a shared secret. This module lives in `core` (zero
//! internal deps) so both the API layer and any future CLI tooling can
//! verify signatures.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA256 signature over a webhook payload.
///
/// The `secret` is the per-provider signing secret from configuration.
/// Returns the hex-encoded signature string.
pub fn compute_webhook_hmac(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Verify a hex-encoded HMAC-SHA256 signature against a payload.
///
/// Comparison is constant-time via [`Mac::verify_slice`]. Returns `false`
/// for malformed hex as well as for a mismatched signature.
pub fn verify_webhook_hmac(secret: &str, payload: &str, signature: &str) -> bool {
    let Some(expected) = decode_hex(signature) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Decode a lowercase/uppercase hex string. Returns `None` on odd length
/// or non-hex characters, including non-ASCII input.
fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 {
        return None;
    }
    input
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let digits = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(digits, 16).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_produces_hex_string() {
        let sig = compute_webhook_hmac("my_secret", r#"{"event":"test"}"#);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hmac_is_deterministic() {
        let a = compute_webhook_hmac("secret", "payload");
        let b = compute_webhook_hmac("secret", "payload");
        assert_eq!(a, b);
    }

    #[test]
    fn hmac_differs_with_different_secret() {
        let a = compute_webhook_hmac("secret_a", "payload");
        let b = compute_webhook_hmac("secret_b", "payload");
        assert_ne!(a, b);
    }

    #[test]
    fn verify_accepts_a_valid_signature() {
        let sig = compute_webhook_hmac("secret", "payload");
        assert!(verify_webhook_hmac("secret", "payload", &sig));
    }

    #[test]
    fn verify_rejects_a_tampered_payload() {
        let sig = compute_webhook_hmac("secret", "payload");
        assert!(!verify_webhook_hmac("secret", "payload2", &sig));
    }

    #[test]
    fn verify_rejects_malformed_hex() {
        assert!(!verify_webhook_hmac("secret", "payload", "not-hex"));
        assert!(!verify_webhook_hmac("secret", "payload", "abc"));
    }

    #[test]
    fn verify_rejects_non_ascii_signatures() {
        // Multi-byte characters must fail cleanly, not split mid-codepoint.
        assert!(!verify_webhook_hmac("secret", "payload", "ΩΩ"));
        assert!(!verify_webhook_hmac("secret", "payload", "a\u{00e9}b"));
    }
}
