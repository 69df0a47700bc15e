//! # Sessiongate (Cookie Session Gate)
//!
//! `sessiongate` serves a small set of pages behind a cookie based session
//! check. Every request passes through the [`gate`] before it reaches a page.
//!
//! ## Route Classes
//!
//! - **Excluded:** `/api/*`, framework static assets, the favicon and image
//!   files. These bypass the gate entirely.
//! - **Public:** `/`, `/login`, `/register`, `/access-denied` (configurable)
//!   and everything below them.
//! - **Protected:** anything else. Requires a present, well formed and
//!   unexpired session credential, otherwise the client is sent to
//!   `/access-denied?redirect=<requested path>`.
//!
//! ## Credentials
//!
//! The session credential is a `header.payload.signature` token stored in the
//! `access_token` cookie. Two issuance modes exist:
//!
//! 1. **Mock:** credentials are minted locally with a placeholder signature
//!    and only their expiry is checked.
//! 2. **Provider:** credentials come from the identity provider and are
//!    verified with RS256 against its published JWKS, including `iss`, `aud`
//!    and `exp`.
//!
//! `exp` may be a whole or fractional NumericDate and is compared in
//! milliseconds against an injectable [`token::Clock`]. A credential without
//! `exp` counts as expired.

pub mod api;
pub mod cli;
pub mod cookie;
pub mod gate;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent() {
        assert!(APP_USER_AGENT.starts_with("sessiongate/"));
        assert!(APP_USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
