//! Per-request access gate.
//!
//! Every request path is classified by the [`RouteTable`]. Excluded and public
//! paths pass straight through; protected paths need a credential in the
//! session cookie that the configured [`Issuance`] accepts. Anything else is
//! redirected to the denial page with the requested path attached so the
//! client can resume after signing in.

pub mod issuance;
pub mod middleware;
pub mod routes;

pub use self::issuance::{Issuance, IssuanceMode, Verdict};
pub use self::routes::{RouteClass, RouteTable};

use std::{fmt, sync::Arc};

use crate::{
    cookie::DEFAULT_COOKIE_NAME,
    token::{Claims, Clock, SystemClock},
};

pub const DEFAULT_DENIAL_PATH: &str = "/access-denied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Missing,
    Malformed,
    Expired,
    Rejected,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing credential",
            Self::Malformed => "malformed credential",
            Self::Expired => "expired credential",
            Self::Rejected => "rejected credential",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Forward the request. Carries the credential's claims when one was
    /// checked; excluded and public paths carry none.
    Allow(Option<Claims>),
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

pub struct Gate {
    routes: RouteTable,
    issuance: Issuance,
    denial_path: String,
    cookie_name: String,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("routes", &self.routes)
            .field("issuance", &self.issuance.mode())
            .field("denial_path", &self.denial_path)
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl Gate {
    #[must_use]
    pub fn new(routes: RouteTable, issuance: Issuance) -> Self {
        Self {
            routes,
            issuance,
            denial_path: DEFAULT_DENIAL_PATH.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_denial_path(mut self, denial_path: impl Into<String>) -> Self {
        self.denial_path = denial_path.into();
        self
    }

    #[must_use]
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn issuance(&self) -> &Issuance {
        &self.issuance
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn denial_path(&self) -> &str {
        &self.denial_path
    }

    #[must_use]
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Decide for `path` at the gate's clock.
    #[must_use]
    pub fn check(&self, path: &str, credential: Option<&str>) -> Decision {
        self.evaluate(path, credential, self.clock.now_millis())
    }

    /// Decide for `path` given the session cookie value (if any) at `now_millis`.
    #[must_use]
    pub fn evaluate(&self, path: &str, credential: Option<&str>, now_millis: i64) -> Decision {
        if self.routes.classify(path) != RouteClass::Protected {
            return Decision::Allow(None);
        }

        let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) else {
            return Decision::Deny(DenyReason::Missing);
        };

        match self.issuance.inspect(token, now_millis) {
            Verdict::Valid(claims) => Decision::Allow(Some(claims)),
            Verdict::Malformed => Decision::Deny(DenyReason::Malformed),
            Verdict::Expired => Decision::Deny(DenyReason::Expired),
            Verdict::Rejected => Decision::Deny(DenyReason::Rejected),
        }
    }

    /// Where a denied request for `path` is sent.
    #[must_use]
    pub fn redirect_location(&self, path: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect", path)
            .finish();
        format!("{}?{query}", self.denial_path)
    }
}
