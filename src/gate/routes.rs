use regex::Regex;

/// Paths the gate never looks at: API calls, build assets, the favicon and
/// images by extension.
const EXCLUDED_PATTERN: &str =
    r"^/(?:api|_next/static|_next/image|favicon\.ico|.*\.(?:svg|png|jpg|jpeg|gif|webp)$)";

pub const DEFAULT_PUBLIC_PATHS: [&str; 4] = ["/login", "/register", "/access-denied", "/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Excluded,
    Public,
    Protected,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    public: Vec<String>,
    excluded: Regex,
}

impl RouteTable {
    /// Build a table with the given public paths.
    ///
    /// Blank entries are dropped and trailing slashes trimmed, so `"/login/"`
    /// and `"/login"` are the same route.
    ///
    /// # Errors
    /// Returns an error if the exclusion pattern fails to compile.
    pub fn new<I, S>(public_paths: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let public = public_paths
            .into_iter()
            .filter_map(|path| normalize(path.as_ref()))
            .collect();

        Ok(Self {
            public,
            excluded: Regex::new(EXCLUDED_PATTERN)?,
        })
    }

    /// Table with the default public paths.
    ///
    /// # Errors
    /// Returns an error if the exclusion pattern fails to compile.
    pub fn with_defaults() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_PUBLIC_PATHS)
    }

    #[must_use]
    pub fn public_paths(&self) -> &[String] {
        &self.public
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.excluded.is_match(path) {
            RouteClass::Excluded
        } else if self.is_public(path) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|route| {
            path == route
                || path
                    .strip_prefix(route.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

fn normalize(path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        Some("/".to_string())
    } else if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}
