use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::{Decision, Gate};
use crate::cookie::extract_cookie;

/// Axum middleware running every request through the [`Gate`].
///
/// Allowed requests get the credential's claims in their extensions (when a
/// credential was checked); denied ones are answered with a temporary redirect
/// to the denial page.
pub async fn enforce(State(gate): State<Arc<Gate>>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let credential = extract_cookie(request.headers(), gate.cookie_name());

    match gate.check(&path, credential.as_deref()) {
        Decision::Allow(claims) => {
            if let Some(claims) = claims {
                request.extensions_mut().insert(claims);
            }
            next.run(request).await
        }
        Decision::Deny(reason) => {
            debug!("Denied {path}: {reason}");
            Redirect::temporary(&gate.redirect_location(&path)).into_response()
        }
    }
}
