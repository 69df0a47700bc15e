use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON `NumericDate`: seconds since the epoch, integral or fractional.
///
/// The original JSON form is kept so a decoded payload serializes back the
/// way it was received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericDate {
    Seconds(i64),
    Fractional(f64),
}

impl NumericDate {
    /// Whole seconds, rounded towards the past.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn seconds(self) -> i64 {
        match self {
            Self::Seconds(seconds) => seconds,
            // float to int casts saturate
            Self::Fractional(seconds) => seconds.floor() as i64,
        }
    }

    /// Milliseconds since the epoch, saturating.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn millis(self) -> i64 {
        match self {
            Self::Seconds(seconds) => seconds.saturating_mul(1000),
            Self::Fractional(seconds) => (seconds * 1000.0).floor() as i64,
        }
    }
}

impl From<i64> for NumericDate {
    fn from(seconds: i64) -> Self {
        Self::Seconds(seconds)
    }
}

/// Decoded credential payload.
///
/// The recognized claims are typed; anything else lands in `extra` and is
/// written back unchanged when the claims are serialized again.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user identifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued-at (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<NumericDate>,
    /// Expiry (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<NumericDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    #[must_use]
    pub fn with_sub(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Expiry in milliseconds since epoch, if present.
    #[must_use]
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.exp.map(NumericDate::millis)
    }

    /// The `iss` claim, when it is a string.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.extra.get("iss").and_then(Value::as_str)
    }

    /// The `aud` claim; providers send either a single string or an array.
    #[must_use]
    pub fn audiences(&self) -> Vec<&str> {
        match self.extra.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Copy every claim set on `other` over `self`.
    pub(crate) fn merge(&mut self, other: Self) {
        if other.sub.is_some() {
            self.sub = other.sub;
        }
        if other.email.is_some() {
            self.email = other.email;
        }
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.iat.is_some() {
            self.iat = other.iat;
        }
        if other.exp.is_some() {
            self.exp = other.exp;
        }
        self.extra.extend(other.extra);
    }
}
