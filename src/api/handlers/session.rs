//! Session endpoints: read, create and clear the session cookie.
//!
//! The cookie holds the credential itself; there is no server side session
//! record, so every endpoint re-inspects the credential it is given.

use crate::{
    api::state::AppState,
    gate::{IssuanceMode, Verdict},
    token::{self, Claims, inspect},
};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;
use utoipa::ToSchema;

/// Identity used by the mock login when the request names none.
pub const DEMO_SUB: &str = "user-123";
pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_NAME: &str = "Demo User";

const LANDING_PATH: &str = "/dashboard";
/// Seconds the browser waits before following the `Refresh` header back to
/// the login page.
const LOGIN_RETRY_DELAY_SECONDS: u8 = 2;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub expires_in: u64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct MockSessionRequest {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Lifetime of the minted credential; negative values mint one that is
    /// already expired.
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenSessionRequest {
    pub access_token: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionCreated {
    pub redirect: String,
    pub expires_in: u64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionError {
    pub error: String,
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "session"
)]
pub async fn session(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    // Missing or unusable cookies are treated as "no session".
    let Some(token) = state.cookie().extract(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let now = state.gate().now_millis();
    match state.gate().issuance().inspect(&token, now) {
        Verdict::Valid(claims) => Json(session_response(claims, now)).into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/session/mock",
    request_body(content = MockSessionRequest, description = "Optional identity and lifetime"),
    responses(
        (status = 200, description = "Demo credential set", body = SessionCreated),
        (status = 404, description = "Mock issuance disabled", body = SessionError),
        (status = 500, description = "Credential could not be set", body = SessionError)
    ),
    tag = "session"
)]
pub async fn mock(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<MockSessionRequest>>,
) -> impl IntoResponse {
    if state.gate().issuance().mode() != IssuanceMode::Mock {
        return error_response(StatusCode::NOT_FOUND, "mock issuance is disabled");
    }

    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let ttl_seconds = request.ttl_seconds.unwrap_or(state.mock_ttl_seconds());
    let claims = Claims::default()
        .with_sub(request.sub.unwrap_or_else(|| DEMO_SUB.to_string()))
        .with_email(request.email.unwrap_or_else(|| DEMO_EMAIL.to_string()))
        .with_name(request.name.unwrap_or_else(|| DEMO_NAME.to_string()));

    let now = state.gate().now_millis();
    let token = match token::mint_at(claims, ttl_seconds, now.div_euclid(1000)) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint demo credential: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to mint credential");
        }
    };

    let redirect = request
        .redirect
        .as_deref()
        .map_or_else(|| LANDING_PATH.to_string(), sanitize_redirect);
    info!("Issued demo credential (ttl {ttl_seconds}s)");

    created_response(&state, &token, redirect, inspect::time_remaining_at(&token, now))
}

#[utoipa::path(
    post,
    path = "/api/session/token",
    request_body = TokenSessionRequest,
    responses(
        (status = 200, description = "Provider credential accepted", body = SessionCreated),
        (status = 400, description = "Missing payload", body = SessionError),
        (status = 401, description = "Credential rejected; client is sent back to login", body = SessionError),
        (status = 404, description = "Provider issuance disabled", body = SessionError)
    ),
    tag = "session"
)]
pub async fn token(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<TokenSessionRequest>>,
) -> impl IntoResponse {
    let Some(verifier) = state.gate().issuance().verifier() else {
        return error_response(StatusCode::NOT_FOUND, "provider issuance is disabled");
    };
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "missing payload");
    };

    let access_token = request.access_token.trim();
    let now = state.gate().now_millis();
    let claims = match verifier.verify(access_token, now.div_euclid(1000)) {
        Ok(claims) => claims,
        Err(err) => {
            warn!("Provider credential rejected: {err}");
            let mut response =
                error_response(StatusCode::UNAUTHORIZED, "authentication failed, please try again");
            let refresh = format!(
                "{LOGIN_RETRY_DELAY_SECONDS}; url={}",
                state.login_path()
            );
            if let Ok(value) = HeaderValue::from_str(&refresh) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static("refresh"), value);
            }
            return response;
        }
    };

    info!(
        "Provider session established for {}",
        claims.email.as_deref().unwrap_or("unknown user")
    );

    let redirect = sanitize_redirect(request.redirect.as_deref().unwrap_or("/"));
    let expires_in = inspect::claims_time_remaining_at(&claims, now);
    created_response(&state, access_token, redirect, expires_in)
}

#[utoipa::path(
    post,
    path = "/api/session/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "session"
)]
pub async fn logout(state: Extension<Arc<AppState>>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    match state.cookie().clear_cookie() {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }
    (StatusCode::NO_CONTENT, headers)
}

/// Keep post-login targets on this origin: only absolute local paths are
/// accepted, anything else falls back to `/`.
///
/// Browsers strip tabs and newlines from URLs before resolving them, so a
/// target carrying any control character or whitespace is refused outright.
#[must_use]
pub fn sanitize_redirect(target: &str) -> String {
    let target = target.trim();
    let local = target.starts_with('/')
        && !target.starts_with("//")
        && !target
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
        && resolves_on_same_origin(target);

    if local {
        target.to_string()
    } else {
        "/".to_string()
    }
}

fn resolves_on_same_origin(target: &str) -> bool {
    let Ok(base) = Url::parse("http://localhost/") else {
        return false;
    };
    base.join(target)
        .is_ok_and(|resolved| resolved.origin() == base.origin())
}

fn session_response(claims: Claims, now_millis: i64) -> SessionResponse {
    let expires_in = inspect::claims_time_remaining_at(&claims, now_millis);
    SessionResponse {
        sub: claims.sub,
        email: claims.email,
        name: claims.name,
        expires_in,
    }
}

fn created_response(state: &AppState, token: &str, redirect: String, expires_in: u64) -> Response {
    let cookie = match state.cookie().session_cookie(token) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to set session");
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(SessionCreated {
            redirect,
            expires_in,
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(SessionError {
            error: message.to_string(),
        }),
    )
        .into_response()
}
