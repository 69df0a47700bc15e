//! Unsigned demonstration credentials.
//!
//! The header and signature segments are fixed placeholders, so anything
//! minted here must never be trusted beyond local development.

use serde::Serialize;

use super::{
    Claims, Error,
    clock::{Clock, SystemClock},
    codec,
};

pub const DEFAULT_SUB: &str = "12345";
pub const DEFAULT_EMAIL: &str = "user@example.com";
pub const DEFAULT_NAME: &str = "Test User";
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

const PLACEHOLDER_SIGNATURE: &[u8] = b"mock-signature";

#[derive(Serialize)]
struct PlaceholderHeader {
    alg: &'static str,
    typ: &'static str,
}

/// Mint a credential valid for `ttl_seconds` from now.
///
/// # Errors
/// Returns an error if the claims cannot be serialized.
pub fn mint(overrides: Claims, ttl_seconds: i64) -> Result<String, Error> {
    mint_at(overrides, ttl_seconds, SystemClock.now_seconds())
}

/// Mint a credential as if the current time were `now_seconds`.
///
/// `overrides` are merged over the demo defaults, so a caller supplied `iat`
/// or `exp` wins over the computed ones. A negative `ttl_seconds` yields an
/// already expired credential.
///
/// # Errors
/// Returns an error if the claims cannot be serialized.
pub fn mint_at(overrides: Claims, ttl_seconds: i64, now_seconds: i64) -> Result<String, Error> {
    let mut claims = Claims {
        sub: Some(DEFAULT_SUB.to_string()),
        email: Some(DEFAULT_EMAIL.to_string()),
        name: Some(DEFAULT_NAME.to_string()),
        iat: Some(now_seconds.into()),
        exp: Some(now_seconds.saturating_add(ttl_seconds).into()),
        ..Claims::default()
    };
    claims.merge(overrides);

    let header = codec::b64e_json(&PlaceholderHeader {
        alg: "HS256",
        typ: "JWT",
    })?;
    let payload = codec::b64e_json(&claims)?;
    let signature = codec::b64e(PLACEHOLDER_SIGNATURE);

    Ok(format!("{header}.{payload}.{signature}"))
}
