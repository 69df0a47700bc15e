use std::{fmt, str::FromStr, sync::Arc};

use tracing::debug;

use crate::token::{self, Claims, ProviderVerifier, inspect};

/// One hour, matching the lifetime of minted demo credentials.
pub const MOCK_COOKIE_MAX_AGE: i64 = 3600;
/// Seven days.
pub const PROVIDER_COOKIE_MAX_AGE: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceMode {
    Mock,
    Provider,
}

impl IssuanceMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Provider => "provider",
        }
    }

    #[must_use]
    pub fn default_cookie_max_age(self) -> i64 {
        match self {
            Self::Mock => MOCK_COOKIE_MAX_AGE,
            Self::Provider => PROVIDER_COOKIE_MAX_AGE,
        }
    }
}

impl fmt::Display for IssuanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "provider" => Ok(Self::Provider),
            other => Err(format!("unknown issuance mode: {other}")),
        }
    }
}

/// How credentials presented to the gate were issued, and therefore how they
/// are checked.
#[derive(Debug, Clone)]
pub enum Issuance {
    /// Locally minted, decode-only.
    Mock,
    /// Issued by the identity provider, RS256 verified.
    Provider(Arc<ProviderVerifier>),
}

/// Result of inspecting a credential.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid(Claims),
    Malformed,
    Expired,
    Rejected,
}

impl Issuance {
    #[must_use]
    pub fn mode(&self) -> IssuanceMode {
        match self {
            Self::Mock => IssuanceMode::Mock,
            Self::Provider(_) => IssuanceMode::Provider,
        }
    }

    #[must_use]
    pub fn verifier(&self) -> Option<&Arc<ProviderVerifier>> {
        match self {
            Self::Mock => None,
            Self::Provider(verifier) => Some(verifier),
        }
    }

    #[must_use]
    pub fn inspect(&self, token: &str, now_millis: i64) -> Verdict {
        let Some(claims) = inspect::decode(token) else {
            return Verdict::Malformed;
        };
        if inspect::claims_expired_at(&claims, now_millis) {
            return Verdict::Expired;
        }

        match self {
            Self::Mock => Verdict::Valid(claims),
            Self::Provider(verifier) => match verifier.verify(token, now_millis.div_euclid(1000)) {
                Ok(claims) => Verdict::Valid(claims),
                Err(token::Error::Expired | token::Error::MissingExp) => Verdict::Expired,
                Err(err) => {
                    debug!("Provider credential rejected: {err}");
                    Verdict::Rejected
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Jwks, mint_at, verify::tests as provider};

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn parses_modes() {
        assert_eq!("mock".parse::<IssuanceMode>(), Ok(IssuanceMode::Mock));
        assert_eq!(" Provider ".parse::<IssuanceMode>(), Ok(IssuanceMode::Provider));
        assert!("oauth".parse::<IssuanceMode>().is_err());
        assert_eq!(IssuanceMode::Provider.to_string(), "provider");
    }

    #[test]
    fn cookie_max_age_per_mode() {
        assert_eq!(IssuanceMode::Mock.default_cookie_max_age(), 3600);
        assert_eq!(IssuanceMode::Provider.default_cookie_max_age(), 604_800);
    }

    #[test]
    fn mock_inspection() -> Result<(), token::Error> {
        let now_ms = NOW * 1000;
        let fresh = mint_at(Claims::default(), 3600, NOW)?;
        let stale = mint_at(Claims::default(), -3600, NOW)?;

        assert!(matches!(Issuance::Mock.inspect(&fresh, now_ms), Verdict::Valid(_)));
        assert_eq!(Issuance::Mock.inspect(&stale, now_ms), Verdict::Expired);
        assert_eq!(Issuance::Mock.inspect("opaque-session-id", now_ms), Verdict::Malformed);
        Ok(())
    }

    #[test]
    fn provider_inspection() -> Result<(), token::Error> {
        let verifier = ProviderVerifier::new(
            provider::test_jwks(),
            provider::ISSUER.to_string(),
            Some(provider::AUDIENCE.to_string()),
        );
        let issuance = Issuance::Provider(Arc::new(verifier));
        let now_ms = NOW * 1000;

        let valid = issuance.inspect(&provider::provider_token(NOW + 60), now_ms);
        assert!(matches!(valid, Verdict::Valid(claims) if claims.sub.as_deref() == Some("auth0|42")));

        assert_eq!(
            issuance.inspect(&provider::provider_token(NOW - 60), now_ms),
            Verdict::Expired
        );

        let minted = mint_at(Claims::default(), 3600, NOW)?;
        assert_eq!(issuance.inspect(&minted, now_ms), Verdict::Rejected);
        Ok(())
    }

    #[test]
    fn provider_without_keys_rejects() {
        let verifier = ProviderVerifier::new(Jwks::default(), provider::ISSUER.to_string(), None);
        let issuance = Issuance::Provider(Arc::new(verifier));
        assert_eq!(
            issuance.inspect(&provider::provider_token(NOW + 60), NOW * 1000),
            Verdict::Rejected
        );
    }
}
