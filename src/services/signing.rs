//! Signed-parameter tokens for the identity-linking flow.
//!
//! ARCHITECTURE
//! ============
//! Linking URLs are handed to an external chat vendor and come back via the
//! user's browser, so the parameters ride in the URL itself and must be
//! tamper-proof. Tokens are salted SHA-256 over the payload, issue time, and
//! deployment secret: `hex(json).issued_at.hex(digest)`.
//!
//! TRADE-OFFS
//! ==========
//! Tokens are verified stateless (no server-side session row), which means
//! they cannot be revoked before `max_age` elapses. Linking links are
//! short-lived and single-purpose, so expiry is the only invalidation.

use std::fmt::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Salt for chat-vendor identity-linking tokens. Distinct per signing
/// context so a token minted for one surface never verifies on another.
pub const LINKING_SALT: &str = "apphub-chat-linking";

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn digest(secret: &str, salt: &str, payload: &[u8], issued_at: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"\x00");
    hasher.update(payload);
    hasher.update(b"\x00");
    hasher.update(issued_at.to_be_bytes());
    hasher.update(b"\x00");
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Sign a JSON params object into a URL-safe token.
///
/// # Errors
///
/// Returns `Malformed` if the params cannot be serialized.
pub fn sign(secret: &str, salt: &str, params: &Value) -> Result<String, SigningError> {
    sign_at(secret, salt, params, now_secs())
}

fn sign_at(secret: &str, salt: &str, params: &Value, issued_at: u64) -> Result<String, SigningError> {
    let payload = serde_json::to_vec(params).map_err(|_| SigningError::Malformed)?;
    let sig = digest(secret, salt, &payload, issued_at);
    Ok(format!("{}.{issued_at}.{}", bytes_to_hex(&payload), bytes_to_hex(&sig)))
}

/// Verify a token and recover its params.
///
/// # Errors
///
/// `Malformed` for tokens that do not parse, `BadSignature` for tampered or
/// wrong-secret tokens, `Expired` for tokens older than `max_age`.
pub fn unsign(secret: &str, salt: &str, token: &str, max_age: Duration) -> Result<Value, SigningError> {
    unsign_at(secret, salt, token, max_age, now_secs())
}

fn unsign_at(secret: &str, salt: &str, token: &str, max_age: Duration, now: u64) -> Result<Value, SigningError> {
    let mut parts = token.splitn(3, '.');
    let (Some(payload_hex), Some(ts_part), Some(sig_hex)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(SigningError::Malformed);
    };

    let payload = hex_to_bytes(payload_hex).ok_or(SigningError::Malformed)?;
    let issued_at: u64 = ts_part.parse().map_err(|_| SigningError::Malformed)?;
    let sig = hex_to_bytes(sig_hex).ok_or(SigningError::Malformed)?;

    // Signature check comes before expiry so attackers learn nothing about
    // the timestamp from forged tokens.
    let expected = digest(secret, salt, &payload, issued_at);
    if !constant_time_eq(&sig, &expected) {
        return Err(SigningError::BadSignature);
    }

    if now.saturating_sub(issued_at) > max_age.as_secs() {
        return Err(SigningError::Expired);
    }

    serde_json::from_slice(&payload).map_err(|_| SigningError::Malformed)
}

#[cfg(test)]
#[path = "signing_test.rs"]
mod tests;
