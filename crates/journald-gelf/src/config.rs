// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::compression::Compression;
use crate::errors::ConfigError;
use crate::scheduler::RetryStrategy;

pub const DEFAULT_GRAYLOG_PORT: u16 = 12201;
pub const DEFAULT_PACKET_SIZE: usize = 1420;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_LINE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

// 12 bytes of chunk header plus at least one byte of payload.
const MIN_PACKET_SIZE: usize = 13;
// Largest UDP payload over IPv4.
const MAX_PACKET_SIZE: usize = 65_507;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Forwarder configuration, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Hostname or IP of the Graylog server. No default.
    pub graylog_host: String,
    /// Port of the Graylog GELF UDP input
    pub graylog_port: u16,
    /// Largest datagram the forwarder will emit, chunk headers included
    pub packet_size: usize,
    /// `;`-separated blacklist patterns
    pub blacklist: String,
    /// Whether the undecoded journald line is sent as `_RawLogLine`
    pub include_raw_line: bool,
    /// Send attempts per record before giving up
    pub retry_attempts: u32,
    /// Compression applied to each GELF payload before chunking
    pub compression: Compression,
    /// Input lines longer than this are skipped
    pub max_line_size: usize,
    /// Whether to wait for the destination to become reachable before reading input
    pub connect_probe: bool,
    /// Upper bound on the startup connectivity probe
    pub connect_timeout: Duration,
    /// Verbose diagnostics (payloads are logged at debug level)
    pub verbose: bool,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            graylog_host: String::new(),
            graylog_port: DEFAULT_GRAYLOG_PORT,
            packet_size: DEFAULT_PACKET_SIZE,
            blacklist: String::new(),
            include_raw_line: false,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            compression: Compression::default(),
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            connect_probe: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            verbose: false,
            log_level: "info".to_string(),
        }
    }
}

impl ForwarderConfig {
    /// Create configuration from `J2G_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            graylog_host: env::var("J2G_HOSTNAME")
                .map(|host| host.trim().to_string())
                .unwrap_or_default(),
            graylog_port: parse_var("J2G_PORT")?.unwrap_or(defaults.graylog_port),
            packet_size: parse_var("J2G_PACKET_SIZE")?.unwrap_or(defaults.packet_size),
            blacklist: env::var("J2G_BLACKLIST").unwrap_or_default(),
            include_raw_line: parse_bool_var("J2G_INCLUDE_RAWLOGLINE")?
                .unwrap_or(defaults.include_raw_line),
            retry_attempts: parse_var("J2G_RETRY_ATTEMPTS")?.unwrap_or(defaults.retry_attempts),
            compression: parse_var("J2G_COMPRESSION")?.unwrap_or(defaults.compression),
            max_line_size: parse_var("J2G_MAX_LINE_SIZE")?.unwrap_or(defaults.max_line_size),
            connect_probe: parse_bool_var("J2G_CONNECT_PROBE")?.unwrap_or(defaults.connect_probe),
            connect_timeout: parse_var("J2G_CONNECT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            verbose: parse_bool_var("J2G_VERBOSE")?.unwrap_or(defaults.verbose),
            log_level: env::var("J2G_LOG_LEVEL")
                .map(|val| val.to_lowercase())
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.graylog_host.is_empty() {
            return Err(ConfigError::MissingHost);
        }

        if self.graylog_port == 0 {
            return Err(ConfigError::Invalid(
                "J2G_PORT must be greater than 0".to_string(),
            ));
        }

        if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&self.packet_size) {
            return Err(ConfigError::Invalid(format!(
                "J2G_PACKET_SIZE must be between {MIN_PACKET_SIZE} and {MAX_PACKET_SIZE}, got {}",
                self.packet_size
            )));
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "J2G_RETRY_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.max_line_size == 0 {
            return Err(ConfigError::Invalid(
                "J2G_MAX_LINE_SIZE must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Per-record retry policy. Attempts are immediate: they cover transient local
    /// send errors, not remote congestion.
    #[must_use]
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::Immediate(self.retry_attempts)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(val) if !val.trim().is_empty() => val.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::Invalid(format!("Unable to parse {name}={val:?}"))
        }),
        _ => Ok(None),
    }
}

fn parse_bool_var(name: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(name) {
        Ok(val) => match val.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid(format!(
                "Unable to parse {name}={val:?} as a boolean"
            ))),
        },
        Err(_) => Ok(None),
    }
}
