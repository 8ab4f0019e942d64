// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! GELF 1.1 message as sent to the Graylog server.
//!
//! Standard keys use the names mandated by GELF. Everything journald-specific goes
//! into `_`-prefixed additional fields.

use std::fmt;

use serde::Serialize;

pub const GELF_VERSION: &str = "1.1";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GelfMessage {
    // Standard GELF fields
    pub version: String,
    pub host: String,
    pub short_message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_message: String,
    pub timestamp: f64,
    pub level: u8,
    pub facility: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,

    // Systemd extended fields
    #[serde(rename = "_BootID")]
    pub boot_id: String,
    #[serde(rename = "_MachineID")]
    pub machine_id: String,
    #[serde(rename = "_UID")]
    pub uid: String,
    #[serde(rename = "_GID")]
    pub gid: String,
    #[serde(rename = "_PID")]
    pub pid: String,
    #[serde(rename = "_Command")]
    pub command: String,
    #[serde(rename = "_Executable")]
    pub executable: String,
    #[serde(rename = "_CommandLine")]
    pub command_line: String,
    #[serde(rename = "_Unit")]
    pub unit: String,
    #[serde(rename = "_LogTransport")]
    pub transport: String,

    // Container runtime log embedded in MESSAGE
    #[serde(rename = "_ContainerTimestamp")]
    pub container_timestamp: String,
    #[serde(rename = "_ContainerLevel")]
    pub container_level: String,

    // Metadata
    #[serde(rename = "_RawLogLine")]
    pub raw_log_line: String,
}

/// Source code location. Either all three keys are sent or none of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SourceLocation {
    pub line: i64,
    pub file: String,
    #[serde(rename = "_function")]
    pub function: String,
}

impl fmt::Display for GelfMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GELF:v{} Host:{} Timestamp:{:.6} Level:{} Facility:{}",
            self.version, self.host, self.timestamp, self.level, self.facility
        )?;
        if let Some(location) = &self.location {
            write!(f, " Line:{} File:{}", location.line, location.file)?;
        }
        write!(f, " Message:{:?}", self.short_message)
    }
}
