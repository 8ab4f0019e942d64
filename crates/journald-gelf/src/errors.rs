// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for every stage of the forwarder.
//!
//! Errors are split by stage so callers can decide whether a record is lost
//! (recoverable, logged and skipped) or the process has to stop (fatal,
//! propagated to the binary as a [`ForwarderError`]).

use std::time::Duration;

/// Errors raised while building or validating the forwarder configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The Graylog server hostname is required but was not specified (J2G_HOSTNAME)")]
    MissingHost,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid blacklist pattern {pattern:?}: {source}")]
    BlacklistPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while turning one journald line into a GELF payload.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Log line is not a valid journald JSON record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Unable to parse PRIORITY {0:?} as a log level")]
    InvalidPriority(String),

    #[error("Unable to parse CODE_LINE {0:?} as a line number")]
    InvalidCodeLine(String),

    #[error("Unable to serialize GELF message: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl MapError {
    /// Whether this error must stop the whole pipeline rather than drop the record.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidPriority(_) | Self::Serialize(_))
    }
}

/// Errors raised while framing or sending datagrams.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Too many chunks to generate for GELF: {count}, max: {max}")]
    TooManyChunks { count: usize, max: usize },

    #[error("Unable to resolve {0}")]
    Resolve(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by the delivery scheduler once retries are settled.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("GELF message too large: {0}")]
    MessageTooLarge(#[source] TransportError),

    #[error("Failed to send GELF message after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },
}

/// Errors raised by the startup connectivity probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Destination still unreachable after {elapsed:?} ({attempts} attempts): {last_error}")]
    Timeout {
        elapsed: Duration,
        attempts: u32,
        last_error: String,
    },
}

/// Errors raised while reading input lines.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("Log line exceeds the {max} bytes line buffer")]
    Overflow { max: usize },

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Conditions that stop the forwarder. Everything else is handled per line.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),
}
