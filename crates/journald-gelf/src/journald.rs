// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Journald JSON export records, as produced by `journalctl -o json`.

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// The subset of journald fields the forwarder reads.
///
/// `MESSAGE` and `PRIORITY` must be present; every other field defaults to an empty
/// string. Journald renders values that are not valid UTF-8 as arrays of bytes and
/// values too large to export as `null`, so every field goes through
/// [`deserialize_field`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct JournalEntry {
    // User journal fields
    #[serde(rename = "MESSAGE", deserialize_with = "deserialize_field")]
    pub message: String,
    #[serde(rename = "PRIORITY", deserialize_with = "deserialize_field")]
    pub priority: String,
    #[serde(rename = "CODE_FILE", default, deserialize_with = "deserialize_field")]
    pub code_file: String,
    #[serde(rename = "CODE_LINE", default, deserialize_with = "deserialize_field")]
    pub code_line: String,
    #[serde(rename = "CODE_FUNCTION", default, deserialize_with = "deserialize_field")]
    pub code_function: String,
    #[serde(rename = "SYSLOG_FACILITY", default, deserialize_with = "deserialize_field")]
    pub syslog_facility: String,
    #[serde(rename = "SYSLOG_IDENTIFIER", default, deserialize_with = "deserialize_field")]
    pub syslog_identifier: String,

    // Trusted journal fields
    #[serde(rename = "_PID", default, deserialize_with = "deserialize_field")]
    pub pid: String,
    #[serde(rename = "_UID", default, deserialize_with = "deserialize_field")]
    pub uid: String,
    #[serde(rename = "_GID", default, deserialize_with = "deserialize_field")]
    pub gid: String,
    #[serde(rename = "_COMM", default, deserialize_with = "deserialize_field")]
    pub command: String,
    #[serde(rename = "_EXE", default, deserialize_with = "deserialize_field")]
    pub executable: String,
    #[serde(rename = "_CMDLINE", default, deserialize_with = "deserialize_field")]
    pub command_line: String,
    #[serde(rename = "_SYSTEMD_UNIT", default, deserialize_with = "deserialize_field")]
    pub systemd_unit: String,
    #[serde(rename = "_BOOT_ID", default, deserialize_with = "deserialize_field")]
    pub boot_id: String,
    #[serde(rename = "_MACHINE_ID", default, deserialize_with = "deserialize_field")]
    pub machine_id: String,
    #[serde(rename = "_HOSTNAME", default, deserialize_with = "deserialize_field")]
    pub hostname: String,
    /// One of `audit`, `driver`, `syslog`, `journal`, `stdout`, `kernel`
    #[serde(rename = "_TRANSPORT", default, deserialize_with = "deserialize_field")]
    pub transport: String,

    // Address fields
    #[serde(rename = "__REALTIME_TIMESTAMP", default, deserialize_with = "deserialize_field")]
    pub realtime_timestamp: String,
}

/// Deserializes a journald field value into a string.
///
/// Accepts a string, `null` (empty), an array of byte values (lossy UTF-8) or a
/// number. When a field appears several times journald emits an array of values;
/// the first one is used.
pub fn deserialize_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    Ok(field_to_string(value))
}

fn field_to_string(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        JsonValue::Null => String::new(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Array(items) => {
            if items.iter().all(JsonValue::is_u64) {
                let bytes = items
                    .iter()
                    .filter_map(JsonValue::as_u64)
                    .filter_map(|b| u8::try_from(b).ok())
                    .collect::<Vec<u8>>();
                String::from_utf8_lossy(&bytes).into_owned()
            } else {
                items.into_iter().next().map(field_to_string).unwrap_or_default()
            }
        }
        JsonValue::Object(_) => String::new(),
    }
}
