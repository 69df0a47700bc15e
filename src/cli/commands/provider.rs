use clap::{Arg, ArgMatches, Command};

pub const ARG_IDP_DOMAIN: &str = "idp-domain";
pub const ARG_IDP_CLIENT_ID: &str = "idp-client-id";
pub const ARG_IDP_AUDIENCE: &str = "idp-audience";
pub const ARG_IDP_REDIRECT_URI: &str = "idp-redirect-uri";
pub const ARG_IDP_JWKS_URL: &str = "idp-jwks-url";
pub const ARG_IDP_JWKS_REFRESH: &str = "idp-jwks-refresh-seconds";
pub const ARG_APP_KEY: &str = "app-key";
pub const ARG_API_ENDPOINT: &str = "api-endpoint";

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub domain: Option<String>,
    pub client_id: Option<String>,
    pub audience: Option<String>,
    pub redirect_uri: Option<String>,
    pub jwks_url: Option<String>,
    pub jwks_refresh_seconds: u64,
    pub app_key: Option<String>,
    pub api_endpoint: Option<String>,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if `require_provider` is set and the provider domain
    /// or client id is missing.
    pub fn parse(matches: &ArgMatches, require_provider: bool) -> anyhow::Result<Self> {
        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let options = Self {
            domain: get_non_empty(ARG_IDP_DOMAIN),
            client_id: get_non_empty(ARG_IDP_CLIENT_ID),
            audience: get_non_empty(ARG_IDP_AUDIENCE),
            redirect_uri: get_non_empty(ARG_IDP_REDIRECT_URI),
            jwks_url: get_non_empty(ARG_IDP_JWKS_URL),
            jwks_refresh_seconds: matches
                .get_one::<u64>(ARG_IDP_JWKS_REFRESH)
                .copied()
                .unwrap_or(3600),
            app_key: get_non_empty(ARG_APP_KEY),
            api_endpoint: get_non_empty(ARG_API_ENDPOINT),
        };

        if require_provider {
            if options.domain.is_none() {
                anyhow::bail!(
                    "missing required argument: --{ARG_IDP_DOMAIN} (required for provider issuance)"
                );
            }
            if options.client_id.is_none() {
                anyhow::bail!(
                    "missing required argument: --{ARG_IDP_CLIENT_ID} (required for provider issuance)"
                );
            }
        }

        Ok(options)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDP_DOMAIN)
                .long(ARG_IDP_DOMAIN)
                .help("Identity provider tenant domain, e.g. example.eu.auth0.com")
                .long_help(
                    "Identity provider tenant domain, e.g. example.eu.auth0.com.\n\nCredentials must carry `iss` = https://{domain}/ and are verified against the keys published at\nhttps://{domain}/.well-known/jwks.json unless --idp-jwks-url is given.",
                )
                .env("SESSIONGATE_IDP_DOMAIN"),
        )
        .arg(
            Arg::new(ARG_IDP_CLIENT_ID)
                .long(ARG_IDP_CLIENT_ID)
                .help("Identity provider client id")
                .env("SESSIONGATE_IDP_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_IDP_AUDIENCE)
                .long(ARG_IDP_AUDIENCE)
                .help("Expected credential audience (aud)")
                .env("SESSIONGATE_IDP_AUDIENCE"),
        )
        .arg(
            Arg::new(ARG_IDP_REDIRECT_URI)
                .long(ARG_IDP_REDIRECT_URI)
                .help("Where the identity provider sends users after login")
                .env("SESSIONGATE_IDP_REDIRECT_URI")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_IDP_JWKS_URL)
                .long(ARG_IDP_JWKS_URL)
                .help("JWKS URL (default: https://{domain}/.well-known/jwks.json)")
                .env("SESSIONGATE_IDP_JWKS_URL"),
        )
        .arg(
            Arg::new(ARG_IDP_JWKS_REFRESH)
                .long(ARG_IDP_JWKS_REFRESH)
                .help("How often the JWKS is refreshed, in seconds")
                .env("SESSIONGATE_IDP_JWKS_REFRESH_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_APP_KEY)
                .long(ARG_APP_KEY)
                .help("Application key handed to browser code through /api/config")
                .env("SESSIONGATE_APP_KEY"),
        )
        .arg(
            Arg::new(ARG_API_ENDPOINT)
                .long(ARG_API_ENDPOINT)
                .help("Backend API endpoint handed to browser code through /api/config")
                .env("SESSIONGATE_API_ENDPOINT"),
        )
}
