// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mapping of journald records onto GELF messages.
//!
//! Besides renaming fields, the mapper derives a few GELF values:
//! - `host` falls back to the forwarder's own hostname for empty or `localhost` entries
//! - `timestamp` is rebuilt from journald's microsecond `__REALTIME_TIMESTAMP`
//! - `facility` combines the syslog facility and identifier
//! - container runtime lines embedded in `MESSAGE` (`time="…" level=… msg="…"`) are
//!   unwrapped so their own message, timestamp and level surface in GELF

use std::sync::OnceLock;

use bytes::Bytes;
use regex::Regex;
use tracing::warn;

use crate::errors::MapError;
use crate::gelf::{GelfMessage, SourceLocation, GELF_VERSION};
use crate::journald::JournalEntry;

const LOCALHOST: &str = "localhost";
const UNDEFINED_FACILITY: &str = "Undefined";
const EMPTY_MESSAGE: &str = "-";
// Whole seconds in a microsecond epoch timestamp, valid until the year 2286.
const TIMESTAMP_SECONDS_DIGITS: usize = 10;

/// Builds GELF messages from journald lines. Holds only immutable settings.
#[derive(Clone, Debug)]
pub struct FieldMapper {
    default_host: String,
    include_raw_line: bool,
}

/// Fields extracted from a container runtime line found in `MESSAGE`.
#[derive(Debug, PartialEq)]
struct ContainerLog {
    time: String,
    level: String,
    msg: String,
}

impl FieldMapper {
    #[must_use]
    pub fn new(default_host: impl Into<String>, include_raw_line: bool) -> Self {
        Self {
            default_host: default_host.into(),
            include_raw_line,
        }
    }

    /// Maps one raw journald line and serializes the result to GELF JSON.
    pub fn map(&self, line: &[u8]) -> Result<Bytes, MapError> {
        let gelf = self.map_record(line)?;
        serde_json::to_vec(&gelf)
            .map(Bytes::from)
            .map_err(MapError::Serialize)
    }

    /// Maps one raw journald line to a [`GelfMessage`].
    pub fn map_record(&self, line: &[u8]) -> Result<GelfMessage, MapError> {
        let entry: JournalEntry = serde_json::from_slice(line).map_err(MapError::Decode)?;

        let level = entry
            .priority
            .parse::<u8>()
            .map_err(|_| MapError::InvalidPriority(entry.priority.clone()))?;

        let location = source_location(&entry)?;

        let (short_message, full_message, container_timestamp, container_level) =
            match parse_container_log(&entry.message) {
                Some(container) => (
                    container.msg,
                    entry.message.clone(),
                    container.time,
                    container.level,
                ),
                None => (entry.message.clone(), String::new(), String::new(), String::new()),
            };

        let host = if entry.hostname.is_empty() || entry.hostname == LOCALHOST {
            self.default_host.clone()
        } else {
            entry.hostname.clone()
        };

        let raw_log_line = if self.include_raw_line {
            String::from_utf8_lossy(line).into_owned()
        } else {
            String::new()
        };

        Ok(GelfMessage {
            version: GELF_VERSION.to_string(),
            host,
            short_message: non_empty_message(short_message),
            full_message,
            timestamp: parse_timestamp(&entry.realtime_timestamp),
            level,
            facility: facility(&entry.syslog_facility, &entry.syslog_identifier),
            location,
            boot_id: entry.boot_id,
            machine_id: entry.machine_id,
            uid: entry.uid,
            gid: entry.gid,
            pid: entry.pid,
            command: entry.command,
            executable: entry.executable,
            command_line: entry.command_line,
            unit: entry.systemd_unit,
            transport: entry.transport,
            container_timestamp,
            container_level,
            raw_log_line,
        })
    }
}

/// Converts journald's microsecond timestamp (`"1600000000123456"`) to GELF seconds
/// (`1600000000.123456`). Malformed values map to `0.0`.
pub fn parse_timestamp(realtime: &str) -> f64 {
    if realtime.len() < TIMESTAMP_SECONDS_DIGITS || !realtime.bytes().all(|b| b.is_ascii_digit())
    {
        warn!("Malformed __REALTIME_TIMESTAMP {realtime:?}, using a zero timestamp");
        return 0.0;
    }

    let (seconds, fraction) = realtime.split_at(TIMESTAMP_SECONDS_DIGITS);
    let composed = if fraction.is_empty() {
        seconds.to_string()
    } else {
        format!("{seconds}.{fraction}")
    };
    composed.parse::<f64>().unwrap_or_else(|e| {
        warn!("Unable to parse timestamp {composed:?}: {e}, using a zero timestamp");
        0.0
    })
}

/// `"<facility> (<identifier>)"`, whichever of the two is set, or `"Undefined"`.
pub fn facility(syslog_facility: &str, syslog_identifier: &str) -> String {
    match (syslog_facility.is_empty(), syslog_identifier.is_empty()) {
        (false, false) => format!("{syslog_facility} ({syslog_identifier})"),
        (false, true) => syslog_facility.to_string(),
        (true, false) => syslog_identifier.to_string(),
        (true, true) => UNDEFINED_FACILITY.to_string(),
    }
}

fn source_location(entry: &JournalEntry) -> Result<Option<SourceLocation>, MapError> {
    if entry.code_line.is_empty() {
        return Ok(None);
    }
    let line = entry
        .code_line
        .parse::<i64>()
        .map_err(|_| MapError::InvalidCodeLine(entry.code_line.clone()))?;

    Ok(Some(SourceLocation {
        line,
        file: entry.code_file.clone(),
        function: entry.code_function.clone(),
    }))
}

fn non_empty_message(message: String) -> String {
    if message.is_empty() {
        EMPTY_MESSAGE.to_string()
    } else {
        message
    }
}

fn container_log_regex() -> &'static Regex {
    static CONTAINER_LOG: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    CONTAINER_LOG.get_or_init(|| {
        Regex::new(
            r#"time="(?P<time>[^"]*)" level=(?P<level>\w+) msg="(?P<msg>(?:[^"\\]|\\.)*)""#,
        )
        .expect("container log pattern is valid")
    })
}

fn parse_container_log(message: &str) -> Option<ContainerLog> {
    let captures = container_log_regex().captures(message)?;
    Some(ContainerLog {
        time: captures["time"].to_string(),
        level: captures["level"].to_string(),
        msg: unescape(&captures["msg"]),
    })
}

fn unescape(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped @ ('"' | '\\')) => unescaped.push(escaped),
                Some(other) => {
                    unescaped.push('\\');
                    unescaped.push(other);
                }
                None => unescaped.push('\\'),
            }
        } else {
            unescaped.push(c);
        }
    }
    unescaped
}
