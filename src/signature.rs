//! HMAC-SHA256 payload signing.
//!
//! The signature covers the exact bytes transmitted as the request body, so
//! a receiver can verify by recomputing over the raw body it read off the
//! wire.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex signature against `body` and `secret`.
///
/// Constant-time comparison; a length mismatch is "not verified", never an
/// error.
pub fn verify(body: &[u8], signature: &str, secret: &str) -> bool {
    let computed = sign(body, secret);
    if computed.len() != signature.len() {
        return false;
    }
    computed.as_bytes().ct_eq(signature.as_bytes()).into()
}
