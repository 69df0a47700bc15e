use crate::{GIT_COMMIT_HASH, api::state::AppState, gate::Issuance};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    issuance: String,
    provider_keys: String,
}

#[utoipa::path(
    get,
    path= "/api/health",
    responses (
        (status = 200, description = "Gate is ready", body = [Health]),
        (status = 503, description = "Provider signing keys are not loaded", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(method: Method, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    let issuance = state.gate().issuance();

    let (provider_keys, is_healthy) = match issuance {
        Issuance::Mock => ("n/a", true),
        Issuance::Provider(verifier) if verifier.key_count() > 0 => ("ok", true),
        Issuance::Provider(_) => ("missing", false),
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        issuance: issuance.mode().to_string(),
        provider_keys: provider_keys.to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        })
        .unwrap_or_else(|err| {
            error!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        });

    if is_healthy {
        (StatusCode::OK, headers, body)
    } else {
        debug!("Provider keys are not loaded");
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}
