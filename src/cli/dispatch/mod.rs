use crate::cli::{
    actions::{Action, server::Args},
    commands::{gate, provider},
};
use crate::gate::IssuanceMode;
use anyhow::Result;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let gate = gate::Options::parse(matches)?;
    let provider = provider::Options::parse(matches, gate.issuance == IssuanceMode::Provider)?;

    Ok(Action::Server(Args {
        port,
        gate,
        provider,
    }))
}
