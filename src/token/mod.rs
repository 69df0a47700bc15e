//! Bearer credential handling.
//!
//! A credential is a three segment `header.payload.signature` string. The
//! [`inspect`] functions only decode it (no signature check) and judge expiry
//! against a caller supplied clock; [`mint`] produces unsigned demonstration
//! credentials; [`verify`] checks RS256 credentials issued by an identity
//! provider against its published [`jwks`].

pub mod claims;
pub mod clock;
pub mod inspect;
pub mod jwks;
pub mod mint;
pub mod verify;

mod codec;

pub use self::claims::{Claims, NumericDate};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::inspect::{decode, is_expired, is_expired_at, time_remaining, time_remaining_at};
pub use self::jwks::{Jwk, Jwks};
pub use self::mint::{mint, mint_at};
pub use self::verify::{ProviderVerifier, verify_rs256};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64 encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("unknown key id: {0}")]
    UnknownKid(String),
    #[error("missing key id")]
    MissingKid,
    #[error("rsa error")]
    Rsa(#[from] rsa::errors::Error),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("missing expiration")]
    MissingExp,
    #[error("token expired")]
    Expired,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("invalid audience")]
    InvalidAudience,
}
