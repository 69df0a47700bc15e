use crate::api::state::{AppState, ClientConfig};
use axum::{extract::Extension, response::Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Client configuration", body = ClientConfig)
    ),
    tag = "config"
)]
pub async fn config(state: Extension<Arc<AppState>>) -> Json<ClientConfig> {
    Json(state.client().clone())
}
