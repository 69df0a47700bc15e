use crate::cli::telemetry::LogFormat;
use clap::{Arg, ArgMatches, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_FORMAT: &str = "log-format";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>()
            && parsed <= 5
        {
            return Ok(parsed);
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

/// Log line format selected on the command line.
#[must_use]
pub fn log_format(matches: &ArgMatches) -> LogFormat {
    matches
        .get_one::<String>(ARG_LOG_FORMAT)
        .and_then(|format| format.parse().ok())
        .unwrap_or_default()
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SESSIONGATE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_FORMAT)
                .long(ARG_LOG_FORMAT)
                .help("Log line format")
                .env("SESSIONGATE_LOG_FORMAT")
                .default_value("pretty")
                .value_parser(["pretty", "json"]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verbosity(args: &[&str]) -> Option<u8> {
        let mut argv = vec!["sessiongate"];
        argv.extend_from_slice(args);
        with_args(Command::new("sessiongate"))
            .try_get_matches_from(argv)
            .ok()
            .and_then(|matches| matches.get_one::<u8>(ARG_VERBOSITY).copied())
    }

    #[test]
    fn log_level_from_env() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, level) in levels.iter().enumerate() {
            temp_env::with_var("SESSIONGATE_LOG_LEVEL", Some(level), || {
                assert_eq!(verbosity(&[]), u8::try_from(index).ok(), "{level}");
            });
        }
        temp_env::with_var("SESSIONGATE_LOG_LEVEL", Some("3"), || {
            assert_eq!(verbosity(&[]), Some(3));
        });
    }

    #[test]
    fn verbosity_counts_flags() {
        temp_env::with_var("SESSIONGATE_LOG_LEVEL", None::<&str>, || {
            assert_eq!(verbosity(&["-vvv"]), Some(3));
            assert_eq!(verbosity(&[]), Some(0));
        });
    }

    #[test]
    fn log_format_from_flag_and_env() {
        fn matches(args: &[&str]) -> Result<ArgMatches, clap::Error> {
            let mut argv = vec!["sessiongate"];
            argv.extend_from_slice(args);
            with_args(Command::new("sessiongate")).try_get_matches_from(argv)
        }

        temp_env::with_var("SESSIONGATE_LOG_FORMAT", None::<&str>, || {
            assert!(matches(&[]).is_ok_and(|m| log_format(&m) == LogFormat::Pretty));
            assert!(matches(&["--log-format", "json"]).is_ok_and(|m| log_format(&m) == LogFormat::Json));
            assert!(matches(&["--log-format", "xml"]).is_err());
        });
        temp_env::with_var("SESSIONGATE_LOG_FORMAT", Some("json"), || {
            assert!(matches(&[]).is_ok_and(|m| log_format(&m) == LogFormat::Json));
        });
    }
}
