use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};

pub const DEFAULT_COOKIE_NAME: &str = "access_token";

/// Attributes of the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    name: String,
    max_age_seconds: i64,
    secure: bool,
}

impl CookiePolicy {
    #[must_use]
    pub fn new(max_age_seconds: i64) -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            max_age_seconds,
            secure: true,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn max_age_seconds(&self) -> i64 {
        self.max_age_seconds
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// `Set-Cookie` value storing `token`.
    ///
    /// # Errors
    /// Returns an error if `token` contains bytes not allowed in a header.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        self.render(token, self.max_age_seconds)
    }

    /// `Set-Cookie` value that makes the browser drop the session cookie.
    ///
    /// # Errors
    /// Returns an error if the configured name is not a valid header value.
    pub fn clear_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={value}; Path=/; Max-Age={max_age}; SameSite=Strict; HttpOnly",
            self.name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    /// Read this policy's cookie from the request headers.
    #[must_use]
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, &self.name)
    }
}

/// First value of cookie `name` across all `Cookie` headers.
#[must_use]
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}
