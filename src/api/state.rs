use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{cookie::CookiePolicy, gate::Gate, token::mint::DEFAULT_TTL_SECONDS};

pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Identity provider settings handed to browser code.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "redirectUri", default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

/// Body of `GET /api/config`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(rename = "apiEndpoint", default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    pub auth0: ProviderConfig,
}

impl ClientConfig {
    /// Provider authorize URL for the implicit flow, when domain and client
    /// id are known.
    #[must_use]
    pub fn authorize_url(&self) -> Option<String> {
        let domain = self.auth0.domain.as_deref()?.trim_end_matches('/');
        let client_id = self.auth0.client_id.as_deref()?;

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("response_type", "token")
            .append_pair("client_id", client_id)
            .append_pair("scope", "openid profile email");
        if let Some(redirect_uri) = &self.auth0.redirect_uri {
            query.append_pair("redirect_uri", redirect_uri);
        }
        if let Some(audience) = &self.auth0.audience {
            query.append_pair("audience", audience);
        }
        // custom authorize parameter, forwarded by the provider to its rules
        if let Some(app_key) = &self.auth0.app_key {
            query.append_pair("app_key", app_key);
        }

        let base = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        };
        Some(format!("{base}/authorize?{}", query.finish()))
    }
}

/// Everything request handlers share.
#[derive(Debug)]
pub struct AppState {
    gate: Arc<Gate>,
    cookie: CookiePolicy,
    client: ClientConfig,
    login_path: String,
    mock_ttl_seconds: i64,
}

impl AppState {
    #[must_use]
    pub fn new(gate: Gate, cookie: CookiePolicy) -> Self {
        Self {
            gate: Arc::new(gate),
            cookie,
            client: ClientConfig::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            mock_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_client_config(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    #[must_use]
    pub fn with_mock_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.mock_ttl_seconds = ttl_seconds;
        self
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    #[must_use]
    pub fn cookie(&self) -> &CookiePolicy {
        &self.cookie
    }

    #[must_use]
    pub fn client(&self) -> &ClientConfig {
        &self.client
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn mock_ttl_seconds(&self) -> i64 {
        self.mock_ttl_seconds
    }
}
