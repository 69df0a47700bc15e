//! Minimal HTML pages around the gate.

use crate::{
    api::{handlers::session::sanitize_redirect, state::AppState},
    gate::IssuanceMode,
    token::Claims,
};
use axum::{
    Router,
    extract::{Extension, Query},
    response::Html,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize, Debug, Default)]
pub struct RedirectQuery {
    redirect: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/register", get(register))
        .route("/access-denied", get(access_denied))
        .route("/dashboard", get(dashboard))
}

// Sends a provider access token found in the URL fragment to the session
// endpoint, then follows the answer.
const PROVIDER_CALLBACK_SCRIPT: &str = r"<script>
const params = new URLSearchParams(window.location.hash.slice(1));
const accessToken = params.get('access_token');
if (accessToken) {
  const redirect = new URLSearchParams(window.location.search).get('redirect') || '/';
  fetch('/api/session/token', {
    method: 'POST',
    headers: {'content-type': 'application/json'},
    body: JSON.stringify({access_token: accessToken, redirect}),
  })
    .then(res => res.ok ? res.json() : Promise.reject(res.status))
    .then(body => { window.location.replace(body.redirect); })
    .catch(() => {
      document.getElementById('status').textContent = 'Authentication failed. Redirecting to login...';
      setTimeout(() => { window.location.replace('/login'); }, 2000);
    });
}
</script>";

const MOCK_LOGIN_SCRIPT: &str = r"<script>
function mockLogin(ttlSeconds) {
  const redirect = new URLSearchParams(window.location.search).get('redirect') || '/dashboard';
  fetch('/api/session/mock', {
    method: 'POST',
    headers: {'content-type': 'application/json'},
    body: JSON.stringify({ttl_seconds: ttlSeconds, redirect}),
  })
    .then(res => res.ok ? res.json() : Promise.reject(res.status))
    .then(body => { window.location.assign(body.redirect); })
    .catch(() => { document.getElementById('status').textContent = 'Login failed. Please try again.'; });
}
</script>";

const LOGOUT_SCRIPT: &str = r"<script>
function logout() {
  fetch('/api/session/logout', {method: 'POST'}).then(() => { window.location.assign('/'); });
}
</script>";

pub async fn home(state: Extension<Arc<AppState>>) -> Html<String> {
    let callback = match state.gate().issuance().mode() {
        IssuanceMode::Provider => PROVIDER_CALLBACK_SCRIPT,
        IssuanceMode::Mock => "",
    };
    page(
        "Home",
        &format!(
            r#"<h1>Session gate</h1>
<p id="status"></p>
<ul>
<li><a href="{login}">Go to login</a></li>
<li><a href="/dashboard">View dashboard</a></li>
<li><button onclick="logout()">Logout</button></li>
</ul>
{LOGOUT_SCRIPT}
{callback}"#,
            login = escape(state.login_path()),
        ),
    )
}

pub async fn login(state: Extension<Arc<AppState>>) -> Html<String> {
    let body = match state.gate().issuance().mode() {
        IssuanceMode::Mock => format!(
            r#"<h1>Welcome back</h1>
<p>Demo login: a mock credential is stored in a cookie.</p>
<p id="status"></p>
<button onclick="mockLogin({ttl})">Login with mock token</button>
<button onclick="mockLogin(-3600)">Test with expired token</button>
{MOCK_LOGIN_SCRIPT}"#,
            ttl = state.mock_ttl_seconds(),
        ),
        IssuanceMode::Provider => match state.client().authorize_url() {
            Some(url) => format!(
                r#"<h1>Welcome back</h1>
<p><a href="{}">Continue to the identity provider</a></p>"#,
                escape(&url)
            ),
            None => "<h1>Welcome back</h1>\n<p>The identity provider is not configured.</p>"
                .to_string(),
        },
    };
    page("Login", &format!("{body}\n<p><a href=\"/\">Return to home</a></p>"))
}

pub async fn register() -> Html<String> {
    page(
        "Register",
        "<h1>Register</h1>\n<p>Accounts are managed by the identity provider.</p>\n<p><a href=\"/\">Return to home</a></p>",
    )
}

pub async fn access_denied(
    state: Extension<Arc<AppState>>,
    Query(query): Query<RedirectQuery>,
) -> Html<String> {
    let login = match query.redirect.as_deref() {
        Some(redirect) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("redirect", &sanitize_redirect(redirect))
                .finish();
            format!("{}?{query}", state.login_path())
        }
        None => state.login_path().to_string(),
    };

    page(
        "Access denied",
        &format!(
            r#"<h1>Access denied</h1>
<p>Your session has expired or you don't have a valid access token. Please log in to continue.</p>
<p>This could happen because:</p>
<ul>
<li>You are not logged in</li>
<li>Your session has expired</li>
<li>Your access token is invalid</li>
<li>You don't have the required permissions</li>
</ul>
<p><a href="{}">Go to login</a> | <a href="/">Return to home</a></p>"#,
            escape(&login)
        ),
    )
}

pub async fn dashboard(claims: Option<Extension<Claims>>) -> Html<String> {
    let who = claims
        .as_ref()
        .and_then(|Extension(claims)| claims.name.as_deref().or(claims.email.as_deref()))
        .unwrap_or("there");
    page(
        "Dashboard",
        &format!(
            r#"<h1>Dashboard</h1>
<p>Welcome, {}. Your access token is valid.</p>
<button onclick="logout()">Logout</button>
{LOGOUT_SCRIPT}"#,
            escape(who)
        ),
    )
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{body}\n</body>\n</html>\n"
    ))
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[tokio::test]
    async fn dashboard_greets_subject() {
        let claims = Claims::default().with_name("<Jane>");
        let Html(body) = dashboard(Some(Extension(claims))).await;
        assert!(body.contains("Welcome, &lt;Jane&gt;."));

        let Html(body) = dashboard(None).await;
        assert!(body.contains("Welcome, there."));
    }
}
