//! Token generation and webhook signature helpers.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a tracking token (43 chars base64url).
const TRACKING_TOKEN_BYTES: usize = 32;

/// Errors from signature verification.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Invalid signing secret")]
    InvalidSecret,

    #[error("Signature mismatch")]
    Mismatch,

    #[error("Malformed signature header: {0}")]
    Malformed(String),
}

/// Generates an opaque tracking token for open-pixel and unsubscribe links.
///
/// Tokens are 32 random bytes, base64url-encoded without padding, so they are
/// safe to embed in query strings unescaped.
pub fn generate_tracking_token() -> String {
    let mut bytes = [0u8; TRACKING_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Computes the `sha256=<hex>` HMAC signature for a payload.
pub fn sign_payload(payload: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(payload);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verifies a provider webhook signature header against the raw body.
///
/// Expects the `sha256=<hex>` format. Comparison is constant-time via the
/// hmac crate's `verify_slice`.
pub fn verify_signature(
    payload: &[u8],
    secret: &str,
    signature_header: &str,
) -> Result<(), SignatureError> {
    let hex_part = signature_header
        .strip_prefix("sha256=")
        .ok_or_else(|| SignatureError::Malformed("missing sha256= prefix".to_string()))?;
    let expected =
        hex::decode(hex_part).map_err(|e| SignatureError::Malformed(e.to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_token_length_and_charset() {
        let token = generate_tracking_token();
        assert_eq!(token.len(), 43); // 32 bytes base64url, no padding
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tracking_tokens_are_unique() {
        let a = generate_tracking_token();
        let b = generate_tracking_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let payload = br#"{"type":"email.bounced"}"#;
        let signature = sign_payload(payload, "webhook-secret").unwrap();
        assert!(signature.starts_with("sha256="));
        assert_eq!(signature.len(), 7 + 64);
        verify_signature(payload, "webhook-secret", &signature).unwrap();
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let payload = b"payload";
        let signature = sign_payload(payload, "secret-a").unwrap();
        let result = verify_signature(payload, "secret-b", &signature);
        assert!(matches!(result, Err(SignatureError::Mismatch)));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let signature = sign_payload(b"original", "secret").unwrap();
        let result = verify_signature(b"tampered", "secret", &signature);
        assert!(matches!(result, Err(SignatureError::Mismatch)));
    }

    #[test]
    fn test_verify_rejects_malformed_header() {
        let result = verify_signature(b"payload", "secret", "not-a-signature");
        assert!(matches!(result, Err(SignatureError::Malformed(_))));
    }
}
