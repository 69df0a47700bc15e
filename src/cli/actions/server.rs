use crate::{
    api::{self, AppState, ClientConfig, ProviderConfig},
    cli::{
        commands::{gate::Options as GateOptions, provider::Options as ProviderOptions},
        telemetry,
    },
    cookie::CookiePolicy,
    gate::{Gate, Issuance, IssuanceMode, RouteTable},
    token::{
        ProviderVerifier,
        verify::{issuer_for_domain, jwks_url_for_issuer},
    },
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub gate: GateOptions,
    pub provider: ProviderOptions,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the gate configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let (issuance, refresher) = build_issuance(&args).await?;
    let state = build_state(&args, issuance)?;

    let result = api::new(args.port, Arc::new(state)).await;

    if let Some(handle) = refresher {
        handle.abort();
    }
    telemetry::shutdown_tracer();

    result
}

async fn build_issuance(args: &Args) -> Result<(Issuance, Option<JoinHandle<()>>)> {
    match args.gate.issuance {
        IssuanceMode::Mock => Ok((Issuance::Mock, None)),
        IssuanceMode::Provider => {
            let domain = args
                .provider
                .domain
                .as_deref()
                .context("missing required argument: --idp-domain")?;
            let issuer = issuer_for_domain(domain);
            let jwks_url = args
                .provider
                .jwks_url
                .clone()
                .unwrap_or_else(|| jwks_url_for_issuer(&issuer));

            let verifier = Arc::new(
                ProviderVerifier::new_remote(jwks_url, issuer, args.provider.audience.clone())
                    .await?,
            );
            let refresher = verifier
                .spawn_refresh(Duration::from_secs(args.provider.jwks_refresh_seconds));

            Ok((Issuance::Provider(verifier), Some(refresher)))
        }
    }
}

fn build_state(args: &Args, issuance: Issuance) -> Result<AppState> {
    let routes = RouteTable::new(&args.gate.public_paths).context("invalid public paths")?;

    let gate = Gate::new(routes, issuance)
        .with_denial_path(args.gate.denial_path.clone())
        .with_cookie_name(args.gate.cookie_name.clone());

    let cookie = CookiePolicy::new(args.gate.cookie_max_age)
        .with_name(args.gate.cookie_name.clone())
        .with_secure(args.gate.cookie_secure);

    Ok(AppState::new(gate, cookie)
        .with_client_config(client_config(&args.provider))
        .with_login_path(args.gate.login_path.clone())
        .with_mock_ttl_seconds(args.gate.mock_ttl_seconds))
}

fn client_config(provider: &ProviderOptions) -> ClientConfig {
    ClientConfig {
        api_endpoint: provider.api_endpoint.clone(),
        auth0: ProviderConfig {
            app_key: provider.app_key.clone(),
            audience: provider.audience.clone(),
            domain: provider.domain.clone(),
            client_id: provider.client_id.clone(),
            redirect_uri: provider.redirect_uri.clone(),
        },
    }
}

fn log_startup_args(args: &Args) {
    let or_na = |value: &Option<String>| value.clone().unwrap_or_else(|| "n/a".to_string());
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("issuance", args.gate.issuance.to_string()),
        ("cookie_name", args.gate.cookie_name.clone()),
        ("cookie_max_age", args.gate.cookie_max_age.to_string()),
        ("cookie_secure", args.gate.cookie_secure.to_string()),
        ("public_paths", args.gate.public_paths.join(",")),
        ("denial_path", args.gate.denial_path.clone()),
        ("login_path", args.gate.login_path.clone()),
        ("idp_domain", or_na(&args.provider.domain)),
        ("idp_audience", or_na(&args.provider.audience)),
        ("idp_jwks_url", or_na(&args.provider.jwks_url)),
    ];
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
