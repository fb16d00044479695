//! HMAC-SHA256 request signing for outbound webhook deliveries (§4.7),
//! grounded directly on `tos-network-tos/common/src/api/callback.rs`'s
//! `generate_callback_signature`/`constant_time_compare` pair.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `X-Webhook-Signature: sha256=hex(HMAC_SHA256(secret, body))` (§4.7 step
/// 3). Unlike the teacher's callback signature, the source does not mix in
/// a timestamp — the body alone is signed, matching §8 property 7 exactly
/// (`signature == hex(HMAC_SHA256(subscription.secret, b))`).
pub fn sign(secret: &str, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any size");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn signature_header(secret: &str, body: &str) -> String {
    format!("sha256={}", sign(secret, body))
}

/// Constant-time comparison, same rationale as the teacher's
/// `constant_time_compare`: prevents a timing side-channel on signature
/// verification.
pub fn verify(secret: &str, body: &str, signature_header_value: &str) -> bool {
    let expected = signature_header(secret, body);
    constant_time_eq(expected.as_bytes(), signature_header_value.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_64_lowercase_hex_chars() {
        let sig = sign("a-secret-of-at-least-32-bytes!!!", r#"{"a":1}"#);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, sig.to_lowercase());
    }

    #[test]
    fn verify_accepts_matching_signature_and_rejects_tampering() {
        let secret = "a-secret-of-at-least-32-bytes!!!";
        let body = r#"{"event":"TRANSACTION_COMPLETED"}"#;
        let header = signature_header(secret, body);

        assert!(verify(secret, body, &header));
        assert!(!verify(secret, "different body", &header));
        assert!(!verify("different-secret-of-32-bytes!!!", body, &header));
    }
}
