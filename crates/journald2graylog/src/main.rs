// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use journald_gelf::config::ForwarderConfig;
use journald_gelf::forwarder;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Reads `journalctl -o json` output on stdin and forwards it to Graylog over GELF UDP.
///
/// The destination and most settings come from `J2G_*` environment variables;
/// the flags below override them.
#[derive(Debug, Parser)]
#[command(name = "journald2graylog", version, about)]
struct Cli {
    /// Log every GELF payload and lower the log level to debug
    #[arg(long)]
    verbose: bool,

    /// Send the undecoded journald line as `_RawLogLine`
    #[arg(long, conflicts_with = "disable_rawlogline")]
    include_rawlogline: bool,

    /// Never send `_RawLogLine`, whatever J2G_INCLUDE_RAWLOGLINE says
    #[arg(long)]
    disable_rawlogline: bool,
}

impl Cli {
    fn apply(&self, mut config: ForwarderConfig) -> ForwarderConfig {
        if self.verbose {
            config.verbose = true;
        }
        if self.include_rawlogline {
            config.include_raw_line = true;
        }
        if self.disable_rawlogline {
            config.include_raw_line = false;
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ForwarderConfig::from_env().map(|config| cli.apply(config));

    let log_level = match &config {
        Ok(config) if config.verbose => "debug",
        Ok(config) => config.log_level.as_str(),
        Err(_) => DEFAULT_LOG_LEVEL,
    };
    init_logging(log_level);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Error creating config on journald2graylog startup: {e}");
            return ExitCode::FAILURE;
        }
    };
    debug!("Starting journald2graylog with {config:?}");

    match forwarder::run(&config, tokio::io::stdin()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Stopping journald2graylog: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never mix with anything written to stdout.
fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install the log subscriber: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from(["journald2graylog", "--verbose", "--include-rawlogline"]);
        let config = cli.apply(ForwarderConfig::default());
        assert!(config.verbose);
        assert!(config.include_raw_line);
    }

    #[test]
    fn test_disable_rawlogline_wins_over_environment() {
        let cli = Cli::parse_from(["journald2graylog", "--disable-rawlogline"]);
        let config = cli.apply(ForwarderConfig {
            include_raw_line: true,
            ..Default::default()
        });
        assert!(!config.include_raw_line);
        assert!(!config.verbose);
    }

    #[test]
    fn test_conflicting_rawlogline_flags() {
        let result = Cli::try_parse_from([
            "journald2graylog",
            "--include-rawlogline",
            "--disable-rawlogline",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["journald2graylog"]);
        let config = cli.apply(ForwarderConfig::default());
        assert!(!config.verbose);
        assert!(!config.include_raw_line);
    }
}
