//! Token Verification
//!
//! Validates the signed tokens an external auth service issues to players.
//! The server never mints tokens; it only checks the signature and claims.
//!
//! A token is three base64url segments, `header.payload.signature`, signed
//! with HMAC-SHA256 over `header "." payload`. The header contents are not
//! interpreted: the server trusts exactly one algorithm and one key, so the
//! signature check alone decides validity.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 signature.
const SIGNATURE_LEN: usize = 32;

/// Claims extracted from a valid token.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Subject: the stable player id.
    #[serde(default)]
    pub sub: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    /// Expiry, Unix seconds. 0 = no expiry.
    #[serde(default)]
    pub exp: i64,
    /// Issued-at, Unix seconds.
    #[serde(default)]
    pub iat: i64,
}

/// Verification failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Not a three-segment token.
    #[error("malformed token")]
    Malformed,
    /// Signature does not verify against the key.
    #[error("invalid signature")]
    BadSignature,
    /// Payload segment is not a base64url JSON object.
    #[error("invalid payload")]
    BadPayload,
    /// The required `sub` claim is absent or empty.
    #[error("missing 'sub' claim")]
    MissingSubject,
    /// The token's expiry has passed.
    #[error("token expired")]
    Expired,
}

/// Verify a token against the shared key and extract its claims.
pub fn verify_token(token: &str, key: &str) -> Result<TokenClaims, AuthError> {
    let dot1 = token.find('.').ok_or(AuthError::Malformed)?;
    let dot2 = token[dot1 + 1..]
        .find('.')
        .map(|i| i + dot1 + 1)
        .ok_or(AuthError::Malformed)?;

    let signed_part = &token[..dot2];
    let payload_b64 = &token[dot1 + 1..dot2];
    let signature_b64 = &token[dot2 + 1..];

    // HMAC-SHA256 accepts keys of any length.
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| AuthError::BadSignature)?;
    mac.update(signed_part.as_bytes());
    let expected = mac.finalize().into_bytes();

    let actual = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::BadSignature)?;
    if actual.len() != SIGNATURE_LEN {
        return Err(AuthError::BadSignature);
    }

    // Constant-time compare: fold the XOR of every byte pair.
    let mut diff = 0u8;
    for (a, b) in expected.iter().zip(actual.iter()) {
        diff |= a ^ b;
    }
    if diff != 0 {
        return Err(AuthError::BadSignature);
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::BadPayload)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::BadPayload)?;

    if claims.sub.is_empty() {
        return Err(AuthError::MissingSubject);
    }

    if claims.exp > 0 && unix_now() > claims.exp {
        return Err(AuthError::Expired);
    }

    Ok(claims)
}

/// Current wall clock, Unix seconds.
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
