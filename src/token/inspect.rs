//! Decode-only inspection of credentials.
//!
//! None of these functions verify a signature. They are used to read claims
//! and to judge expiry; every failure collapses to "invalid" instead of an
//! error.

use tracing::debug;

use super::{
    Claims,
    clock::{Clock, SystemClock},
    codec,
};

/// Decode the payload of a three segment credential.
///
/// Returns `None` when the credential does not have exactly three segments or
/// when the payload is not base64 encoded JSON object.
#[must_use]
pub fn decode(token: &str) -> Option<Claims> {
    let [_, payload, _] = codec::segments(token).ok()?;
    match codec::b64d_json::<Claims>(payload) {
        Ok(claims) => Some(claims),
        Err(err) => {
            debug!("Error decoding token: {err}");
            None
        }
    }
}

/// Whether the credential is expired (or unreadable) right now.
#[must_use]
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, SystemClock.now_millis())
}

/// Whether the credential is expired at `now_millis`.
///
/// Undecodable credentials and credentials without `exp` count as expired.
#[must_use]
pub fn is_expired_at(token: &str, now_millis: i64) -> bool {
    decode(token).is_none_or(|claims| claims_expired_at(&claims, now_millis))
}

/// Seconds left before the credential expires, floored, never negative.
#[must_use]
pub fn time_remaining(token: &str) -> u64 {
    time_remaining_at(token, SystemClock.now_millis())
}

#[must_use]
pub fn time_remaining_at(token: &str, now_millis: i64) -> u64 {
    decode(token).map_or(0, |claims| claims_time_remaining_at(&claims, now_millis))
}

pub(crate) fn claims_expired_at(claims: &Claims, now_millis: i64) -> bool {
    claims
        .expires_at_millis()
        .is_none_or(|expires_at| now_millis >= expires_at)
}

pub(crate) fn claims_time_remaining_at(claims: &Claims, now_millis: i64) -> u64 {
    let Some(expires_at) = claims.expires_at_millis() else {
        return 0;
    };
    let remaining = expires_at.saturating_sub(now_millis);
    if remaining <= 0 {
        return 0;
    }
    u64::try_from(remaining / 1000).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{NumericDate, codec::b64e, mint_at};
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn token_with_payload(payload: &serde_json::Value) -> String {
        format!(
            "{}.{}.{}",
            b64e(br#"{"alg":"HS256","typ":"JWT"}"#),
            b64e(payload.to_string().as_bytes()),
            b64e(b"sig")
        )
    }

    #[test]
    fn decode_rejects_wrong_segment_counts() {
        for token in ["", "abc", "a.b", "a.b.c.d", "....", "eyJzdWIiOiIxIn0"] {
            assert!(decode(token).is_none(), "{token:?} should not decode");
        }
    }

    #[test]
    fn decode_rejects_bad_payloads() {
        assert!(decode("a.!!!.c").is_none());
        assert!(decode(&format!("a.{}.c", b64e(b"not json"))).is_none());
        assert!(decode(&format!("a.{}.c", b64e(b"[1,2,3]"))).is_none());
        assert!(decode(&format!("a.{}.c", b64e(br#"{"exp":"soon"}"#))).is_none());
    }

    #[test]
    fn decode_reads_claims() {
        let token = token_with_payload(&json!({"sub": "u1", "email": "a@b.c", "exp": NOW}));
        let claims = decode(&token);
        assert_eq!(claims.as_ref().and_then(|c| c.sub.as_deref()), Some("u1"));
        assert_eq!(claims.and_then(|c| c.exp), Some(NumericDate::Seconds(NOW)));
    }

    #[test]
    fn fractional_iat_does_not_break_decoding() {
        let token = token_with_payload(&json!({"sub": "u", "iat": 1_700_000_000.25, "exp": NOW + 3600}));
        assert_eq!(decode(&token).and_then(|c| c.sub), Some("u".to_string()));
        assert!(!is_expired_at(&token, NOW * 1000));
        assert_eq!(time_remaining_at(&token, NOW * 1000), 3600);
    }

    #[test]
    fn fractional_exp_compares_in_millis() {
        let token = token_with_payload(&json!({"exp": 1_700_003_600.5}));
        assert!(decode(&token).is_some());
        assert!(!is_expired_at(&token, 1_700_003_600_499));
        assert!(is_expired_at(&token, 1_700_003_600_500));
        assert_eq!(time_remaining_at(&token, NOW * 1000), 3600);
    }

    #[test]
    fn decode_accepts_standard_padded_payloads() {
        // {"sub":"1"} in standard base64 with padding
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0=.c2ln";
        assert_eq!(decode(token).and_then(|c| c.sub), Some("1".to_string()));
    }

    #[test]
    fn expiry_follows_exp_claim() {
        let now_ms = NOW * 1000;
        let past = token_with_payload(&json!({"exp": NOW - 1}));
        let future = token_with_payload(&json!({"exp": NOW + 1}));
        let exact = token_with_payload(&json!({"exp": NOW}));

        assert!(is_expired_at(&past, now_ms));
        assert!(!is_expired_at(&future, now_ms));
        assert!(is_expired_at(&exact, now_ms));
    }

    #[test]
    fn missing_exp_or_garbage_counts_as_expired() {
        let no_exp = token_with_payload(&json!({"sub": "u1"}));
        assert!(is_expired_at(&no_exp, 0));
        assert!(is_expired_at("garbage", 0));
        assert_eq!(time_remaining_at(&no_exp, 0), 0);
        assert_eq!(time_remaining_at("garbage", 0), 0);
    }

    #[test]
    fn time_remaining_floors_and_never_goes_negative() {
        let token = token_with_payload(&json!({"exp": NOW + 10}));
        let now_ms = NOW * 1000;

        assert_eq!(time_remaining_at(&token, now_ms), 10);
        assert_eq!(time_remaining_at(&token, now_ms + 1), 9);
        assert_eq!(time_remaining_at(&token, now_ms + 9_999), 0);
        assert_eq!(time_remaining_at(&token, now_ms + 10_000), 0);
        assert_eq!(time_remaining_at(&token, now_ms + 50_000), 0);
    }

    #[test]
    fn time_remaining_is_monotonic() {
        let token = token_with_payload(&json!({"exp": NOW + 120}));
        let mut previous = u64::MAX;
        for step in 0..300 {
            let remaining = time_remaining_at(&token, NOW * 1000 + step * 733);
            assert!(remaining <= previous);
            previous = remaining;
        }
    }

    #[test]
    fn minted_token_expires_after_its_ttl() -> Result<(), crate::token::Error> {
        let token = mint_at(Claims::default(), 3600, NOW)?;
        assert!(!is_expired_at(&token, NOW * 1000));
        assert!(!is_expired_at(&token, (NOW + 3599) * 1000));
        assert!(is_expired_at(&token, (NOW + 3601) * 1000));
        Ok(())
    }

    #[test]
    fn system_clock_helpers_agree_with_fresh_tokens() -> Result<(), crate::token::Error> {
        let token = crate::token::mint(Claims::default(), 3600)?;
        assert!(!is_expired(&token));
        let remaining = time_remaining(&token);
        assert!(remaining > 3500 && remaining <= 3600, "remaining={remaining}");

        let expired = crate::token::mint(Claims::default(), -3600)?;
        assert!(is_expired(&expired));
        assert_eq!(time_remaining(&expired), 0);
        Ok(())
    }
}
