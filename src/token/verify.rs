//! RS256 verification of identity provider credentials.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use serde::Deserialize;
use sha2::Sha256;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use super::{Claims, Error, Jwks, codec};

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// Verify an RS256 credential and return its decoded claims.
///
/// `expected_audience` is only checked when given. The credential must carry
/// an `exp` later than `now_unix_seconds`.
///
/// # Errors
///
/// Returns an error if:
/// - the token is malformed or contains invalid base64/json,
/// - the `kid` is missing or unknown for the provided JWKS,
/// - the signature is invalid,
/// - the claims fail validation (`iss`, `aud`, `exp`).
pub fn verify_rs256(
    token: &str,
    jwks: &Jwks,
    expected_issuer: &str,
    expected_audience: Option<&str>,
    now_unix_seconds: i64,
) -> Result<Claims, Error> {
    let [header_b64, claims_b64, sig_b64] = codec::segments(token)?;

    let header: Header = codec::b64d_json(header_b64)?;
    if header.alg != "RS256" {
        return Err(Error::UnsupportedAlg(header.alg));
    }
    let kid = header.kid.ok_or(Error::MissingKid)?;

    let jwk = jwks
        .find_by_kid(&kid)
        .ok_or_else(|| Error::UnknownKid(kid.clone()))?;

    let public_key = jwk.to_rsa_public_key()?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature_bytes = codec::b64d(sig_b64)?;
    let signature =
        Signature::try_from(signature_bytes.as_slice()).map_err(|_| Error::InvalidSignature)?;
    verifying_key
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| Error::InvalidSignature)?;

    let claims: Claims = codec::b64d_json(claims_b64)?;
    if claims.issuer() != Some(expected_issuer) {
        return Err(Error::InvalidIssuer);
    }
    if let Some(audience) = expected_audience
        && !claims.audiences().contains(&audience)
    {
        return Err(Error::InvalidAudience);
    }
    match claims.exp {
        None => return Err(Error::MissingExp),
        Some(exp) if exp.millis() <= now_unix_seconds.saturating_mul(1000) => {
            return Err(Error::Expired);
        }
        Some(_) => {}
    }

    Ok(claims)
}

/// Issuer URL the provider stamps into `iss` for a tenant domain.
#[must_use]
pub fn issuer_for_domain(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("https://") || domain.starts_with("http://") {
        format!("{domain}/")
    } else {
        format!("https://{domain}/")
    }
}

/// Default JWKS location for an issuer URL.
#[must_use]
pub fn jwks_url_for_issuer(issuer: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
}

/// Verifies provider credentials against a key set that can be refreshed
/// while requests are being served.
#[derive(Debug)]
pub struct ProviderVerifier {
    jwks: RwLock<Jwks>,
    issuer: String,
    audience: Option<String>,
    remote: Option<Remote>,
}

#[derive(Debug)]
struct Remote {
    url: String,
    client: reqwest::Client,
}

impl ProviderVerifier {
    /// Verifier over a fixed key set.
    #[must_use]
    pub fn new(jwks: Jwks, issuer: String, audience: Option<String>) -> Self {
        Self {
            jwks: RwLock::new(jwks),
            issuer,
            audience,
            remote: None,
        }
    }

    /// Verifier whose keys are fetched from `jwks_url`.
    ///
    /// A failed initial fetch is logged and leaves the key set empty, in which
    /// case every credential is rejected until a refresh succeeds.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub async fn new_remote(
        jwks_url: String,
        issuer: String,
        audience: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        let verifier = Self {
            jwks: RwLock::new(Jwks::default()),
            issuer,
            audience,
            remote: Some(Remote {
                url: jwks_url,
                client,
            }),
        };

        if let Err(err) = verifier.refresh().await {
            error!("Failed to fetch provider keys: {err:#}");
        }

        Ok(verifier)
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.jwks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys
            .len()
    }

    /// Verify `token` as of `now_unix_seconds`.
    ///
    /// # Errors
    /// Returns the first check that failed, see [`verify_rs256`].
    pub fn verify(&self, token: &str, now_unix_seconds: i64) -> Result<Claims, Error> {
        let jwks = self.jwks.read().unwrap_or_else(PoisonError::into_inner);
        verify_rs256(
            token,
            &jwks,
            &self.issuer,
            self.audience.as_deref(),
            now_unix_seconds,
        )
    }

    /// Replace the key set with a fresh copy from the provider.
    ///
    /// The current keys are kept when the fetch fails or returns no keys.
    ///
    /// # Errors
    /// Returns an error if the verifier has no remote source, or the request or
    /// response parsing fails.
    #[instrument(skip(self), fields(url))]
    pub async fn refresh(&self) -> Result<()> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| anyhow!("verifier has no remote key source"))?;
        tracing::Span::current().record("url", remote.url.as_str());

        let response = remote
            .client
            .get(&remote.url)
            .send()
            .await
            .with_context(|| format!("failed to fetch {}", remote.url))?;

        if !response.status().is_success() {
            return Err(anyhow!("{} - {}", remote.url, response.status()));
        }

        let body = response.text().await?;
        let jwks = Jwks::from_json(&body).context("invalid JWKS document")?;
        if jwks.is_empty() {
            return Err(anyhow!("{} returned no keys", remote.url));
        }

        let count = jwks.keys.len();
        *self.jwks.write().unwrap_or_else(PoisonError::into_inner) = jwks;
        debug!("Loaded {count} provider keys");

        Ok(())
    }

    /// Refresh the key set every `every` until the task is aborted.
    pub fn spawn_refresh(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let verifier = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                match verifier.refresh().await {
                    Ok(()) => info!("Refreshed provider keys"),
                    Err(err) => error!("Provider key refresh failed: {err:#}"),
                }
            }
        })
    }
}
