use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, StatusCode, header},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1v15::SigningKey,
    pkcs8::DecodePrivateKey,
    signature::{SignatureEncoding, Signer},
};
use serde_json::{Value, json};
use sessiongate::{
    api::{self, AppState},
    cookie::CookiePolicy,
    gate::{
        Gate, Issuance, RouteTable,
        issuance::{MOCK_COOKIE_MAX_AGE, PROVIDER_COOKIE_MAX_AGE},
    },
    token::{Claims, FixedClock, Jwk, Jwks, ProviderVerifier, mint_at},
};
use sha2::Sha256;
use std::sync::Arc;
use tower::ServiceExt;

const NOW: i64 = 1_700_000_000;
const ISSUER: &str = "https://tenant.example.com/";
const AUDIENCE: &str = "https://api.example.com";
const KID: &str = "integration-kid";
const PROVIDER_KEY_PEM: &str = include_str!("../src/token/testdata/provider_key.pem");

fn mock_app() -> Result<Router> {
    let gate = Gate::new(RouteTable::with_defaults()?, Issuance::Mock)
        .with_clock(Arc::new(FixedClock::from_seconds(NOW)));
    let cookie = CookiePolicy::new(MOCK_COOKIE_MAX_AGE).with_secure(false);
    Ok(api::app(Arc::new(AppState::new(gate, cookie))))
}

fn provider_key() -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(PROVIDER_KEY_PEM).context("test key should parse")
}

fn provider_app() -> Result<Router> {
    let public_key = RsaPublicKey::from(&provider_key()?);
    let jwks = Jwks {
        keys: vec![Jwk::from_rsa_public_key(&public_key, KID)],
    };
    let verifier = ProviderVerifier::new(jwks, ISSUER.to_string(), Some(AUDIENCE.to_string()));
    let gate = Gate::new(
        RouteTable::with_defaults()?,
        Issuance::Provider(Arc::new(verifier)),
    )
    .with_clock(Arc::new(FixedClock::from_seconds(NOW)));
    let cookie = CookiePolicy::new(PROVIDER_COOKIE_MAX_AGE);
    Ok(api::app(Arc::new(AppState::new(gate, cookie))))
}

fn provider_token(exp: i64) -> Result<String> {
    let header = json!({"alg": "RS256", "typ": "JWT", "kid": KID});
    let claims = json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|7",
        "email": "sam@example.com",
        "name": "Sam",
        "exp": exp,
    });
    let signing_input = format!(
        "{}.{}",
        Base64UrlUnpadded::encode_string(header.to_string().as_bytes()),
        Base64UrlUnpadded::encode_string(claims.to_string().as_bytes())
    );
    let signing_key = SigningKey::<Sha256>::new(provider_key()?);
    let signature = signing_key.sign(signing_input.as_bytes());
    Ok(format!(
        "{signing_input}.{}",
        Base64UrlUnpadded::encode_string(&signature.to_vec())
    ))
}

fn mock_token(ttl_seconds: i64) -> Result<String> {
    Ok(mint_at(
        Claims::default().with_name("Demo User"),
        ttl_seconds,
        NOW,
    )?)
}

fn get(path: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("theme=dark; access_token={token}"));
    }
    Ok(builder.body(Body::empty())?)
}

fn post_json(path: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn set_cookie(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
}

async fn body_string(response: Response<Body>) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

#[tokio::test]
async fn public_pages_need_no_session() -> Result<()> {
    for path in ["/", "/login", "/register", "/access-denied"] {
        let response = mock_app()?.oneshot(get(path, None)?).await?;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn protected_page_without_cookie_redirects() -> Result<()> {
    let response = mock_app()?.oneshot(get("/dashboard", None)?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        Some("/access-denied?redirect=%2Fdashboard")
    );
    Ok(())
}

#[tokio::test]
async fn protected_page_redirect_drops_query() -> Result<()> {
    let response = mock_app()?
        .oneshot(get("/dashboard/settings?tab=profile", None)?)
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        Some("/access-denied?redirect=%2Fdashboard%2Fsettings")
    );
    Ok(())
}

#[tokio::test]
async fn protected_page_with_fresh_token() -> Result<()> {
    let token = mock_token(3600)?;
    let response = mock_app()?.oneshot(get("/dashboard", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await?.contains("Welcome, Demo User."));
    Ok(())
}

#[tokio::test]
async fn protected_page_with_expired_or_garbage_token() -> Result<()> {
    let expired = mock_token(-3600)?;
    for token in [expired.as_str(), "not-a-token", "a.b.c"] {
        let response = mock_app()?.oneshot(get("/dashboard", Some(token))?).await?;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{token}");
    }
    Ok(())
}

#[tokio::test]
async fn excluded_paths_bypass_the_gate() -> Result<()> {
    let response = mock_app()?.oneshot(get("/api/config", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = mock_app()?
        .oneshot(get("/api/config", Some("garbage"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // no route, but not redirected either
    let response = mock_app()?.oneshot(get("/logo.svg", None)?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn health_reports_mock_issuance() -> Result<()> {
    let response = mock_app()?.oneshot(get("/api/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-app"));
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["name"], "sessiongate");
    assert_eq!(body["issuance"], "mock");
    assert_eq!(body["provider_keys"], "n/a");
    Ok(())
}

#[tokio::test]
async fn mock_login_session_and_logout() -> Result<()> {
    let app = mock_app()?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/session/mock")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response)
        .context("session cookie")?
        .to_string();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("Max-Age=3600"));
    assert!(cookie.contains("HttpOnly"));
    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["redirect"], "/dashboard");
    assert_eq!(body["expires_in"], 3600);

    let token = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("access_token="))
        .context("cookie value")?;

    let response = app.clone().oneshot(get("/api/session", Some(token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["sub"], "user-123");
    assert_eq!(body["email"], "demo@example.com");

    let response = app.clone().oneshot(get("/dashboard", Some(token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/session/logout")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(
        set_cookie(&response).is_some_and(|cookie| cookie.contains("Max-Age=0")),
        "logout clears the cookie"
    );

    let response = app.oneshot(get("/api/session", None)?).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn mock_login_sanitizes_redirect() -> Result<()> {
    for target in ["//evil.example.com", "/\t/evil.example.com", "/\n/evil.example.com"] {
        let response = mock_app()?
            .oneshot(post_json("/api/session/mock", &json!({"redirect": target}))?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await?)?;
        assert_eq!(body["redirect"], "/", "{target:?}");
    }
    Ok(())
}

#[tokio::test]
async fn provider_endpoint_disabled_in_mock_mode() -> Result<()> {
    let response = mock_app()?
        .oneshot(post_json(
            "/api/session/token",
            &json!({"access_token": "x.y.z"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn provider_token_opens_session() -> Result<()> {
    let app = provider_app()?;
    let token = provider_token(NOW + 600)?;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/session/token",
            &json!({"access_token": token, "redirect": "/dashboard"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).context("session cookie")?;
    assert!(cookie.contains("Max-Age=604800"));
    assert!(cookie.contains("Secure"));
    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["redirect"], "/dashboard");
    assert_eq!(body["expires_in"], 600);

    let response = app.oneshot(get("/dashboard", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await?.contains("Welcome, Sam."));
    Ok(())
}

#[tokio::test]
async fn provider_mode_rejects_unsigned_and_expired() -> Result<()> {
    let app = provider_app()?;

    let unsigned = mock_token(3600)?;
    let response = app.clone().oneshot(get("/dashboard", Some(&unsigned))?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let expired = provider_token(NOW - 1)?;
    let response = app.clone().oneshot(get("/dashboard", Some(&expired))?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let response = app
        .oneshot(post_json(
            "/api/session/token",
            &json!({"access_token": unsigned}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("refresh")
            .and_then(|value| value.to_str().ok()),
        Some("2; url=/login")
    );
    Ok(())
}

#[tokio::test]
async fn provider_health_reports_loaded_keys() -> Result<()> {
    let response = provider_app()?.oneshot(get("/api/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(body["issuance"], "provider");
    assert_eq!(body["provider_keys"], "ok");

    let verifier = ProviderVerifier::new(Jwks::default(), ISSUER.to_string(), None);
    let gate = Gate::new(
        RouteTable::with_defaults()?,
        Issuance::Provider(Arc::new(verifier)),
    );
    let app = api::app(Arc::new(AppState::new(
        gate,
        CookiePolicy::new(PROVIDER_COOKIE_MAX_AGE),
    )));
    let response = app.oneshot(get("/api/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}
