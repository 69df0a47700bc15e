use crate::{
    cookie::DEFAULT_COOKIE_NAME,
    gate::{DEFAULT_DENIAL_PATH, IssuanceMode, routes::DEFAULT_PUBLIC_PATHS},
    api::state::DEFAULT_LOGIN_PATH,
    token::mint::DEFAULT_TTL_SECONDS,
};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::BoolishValueParser};

pub const ARG_ISSUANCE: &str = "issuance";
pub const ARG_COOKIE_NAME: &str = "cookie-name";
pub const ARG_COOKIE_MAX_AGE: &str = "cookie-max-age";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_PUBLIC_PATH: &str = "public-path";
pub const ARG_DENIAL_PATH: &str = "denial-path";
pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_MOCK_TTL: &str = "mock-ttl";

#[derive(Debug, Clone)]
pub struct Options {
    pub issuance: IssuanceMode,
    pub cookie_name: String,
    pub cookie_max_age: i64,
    pub cookie_secure: bool,
    pub public_paths: Vec<String>,
    pub denial_path: String,
    pub login_path: String,
    pub mock_ttl_seconds: i64,
}

impl Options {
    /// Parse gate arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the issuance mode is unknown or a path is not absolute.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let issuance = matches
            .get_one::<String>(ARG_ISSUANCE)
            .map_or(Ok(IssuanceMode::Mock), |mode| mode.parse())
            .map_err(|e| anyhow::anyhow!(e))?;

        let get_non_empty = |id: &str, default: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let denial_path = get_non_empty(ARG_DENIAL_PATH, DEFAULT_DENIAL_PATH);
        let login_path = get_non_empty(ARG_LOGIN_PATH, DEFAULT_LOGIN_PATH);
        for (arg, path) in [(ARG_DENIAL_PATH, &denial_path), (ARG_LOGIN_PATH, &login_path)] {
            if !path.starts_with('/') {
                anyhow::bail!("--{arg} must be an absolute path, got: {path}");
            }
        }

        let public_paths = matches
            .get_many::<String>(ARG_PUBLIC_PATH)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        Ok(Self {
            issuance,
            cookie_name: get_non_empty(ARG_COOKIE_NAME, DEFAULT_COOKIE_NAME),
            cookie_max_age: matches
                .get_one::<i64>(ARG_COOKIE_MAX_AGE)
                .copied()
                .unwrap_or_else(|| issuance.default_cookie_max_age()),
            cookie_secure: matches
                .get_one::<bool>(ARG_COOKIE_SECURE)
                .copied()
                .unwrap_or(true),
            public_paths,
            denial_path,
            login_path,
            mock_ttl_seconds: matches
                .get_one::<i64>(ARG_MOCK_TTL)
                .copied()
                .unwrap_or(DEFAULT_TTL_SECONDS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ISSUANCE)
                .long(ARG_ISSUANCE)
                .help("How session credentials are issued")
                .long_help(
                    "How session credentials are issued.\n\n`mock` mints unsigned demo credentials locally and only checks their expiry.\n`provider` accepts RS256 credentials from the identity provider and verifies them against its JWKS.",
                )
                .env("SESSIONGATE_ISSUANCE")
                .default_value("mock")
                .value_parser(["mock", "provider"]),
        )
        .arg(
            Arg::new(ARG_COOKIE_NAME)
                .long(ARG_COOKIE_NAME)
                .help("Name of the session cookie")
                .env("SESSIONGATE_COOKIE_NAME")
                .default_value(DEFAULT_COOKIE_NAME),
        )
        .arg(
            Arg::new(ARG_COOKIE_MAX_AGE)
                .long(ARG_COOKIE_MAX_AGE)
                .help("Session cookie Max-Age in seconds (default: 3600 mock, 604800 provider)")
                .env("SESSIONGATE_COOKIE_MAX_AGE")
                .value_parser(clap::value_parser!(i64).range(0..)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark the session cookie Secure (disable for plain HTTP development)")
                .env("SESSIONGATE_COOKIE_SECURE")
                .default_value("true")
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_PUBLIC_PATH)
                .long(ARG_PUBLIC_PATH)
                .help("Path reachable without a session; matches itself and everything below it")
                .env("SESSIONGATE_PUBLIC_PATHS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .default_values(DEFAULT_PUBLIC_PATHS),
        )
        .arg(
            Arg::new(ARG_DENIAL_PATH)
                .long(ARG_DENIAL_PATH)
                .help("Where requests without a valid session are redirected")
                .env("SESSIONGATE_DENIAL_PATH")
                .default_value(DEFAULT_DENIAL_PATH),
        )
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long(ARG_LOGIN_PATH)
                .help("Login page clients are sent back to after a failed sign in")
                .env("SESSIONGATE_LOGIN_PATH")
                .default_value(DEFAULT_LOGIN_PATH),
        )
        .arg(
            Arg::new(ARG_MOCK_TTL)
                .long(ARG_MOCK_TTL)
                .help("Lifetime in seconds of credentials minted by the mock login")
                .env("SESSIONGATE_MOCK_TTL")
                .default_value("3600")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
}
