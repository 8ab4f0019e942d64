// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hostname used for records that do not carry a usable `_HOSTNAME`.

use tracing::{debug, warn};

pub const UNKNOWN_HOST: &str = "Unknown Host";

/// Returns the system hostname, or [`UNKNOWN_HOST`] when it cannot be determined.
#[must_use]
pub fn default_host() -> String {
    match nix::unistd::gethostname() {
        Ok(hostname) => usable_host(hostname.to_str()),
        Err(e) => {
            warn!("Failed to get system hostname: {e}, using {UNKNOWN_HOST:?}");
            UNKNOWN_HOST.to_string()
        }
    }
}

fn usable_host(hostname: Option<&str>) -> String {
    match hostname.map(str::trim) {
        Some(host) if !host.is_empty() && host != "localhost" => {
            debug!("Using {host:?} as the default host");
            host.to_string()
        }
        _ => {
            warn!("System hostname is not usable, using {UNKNOWN_HOST:?}");
            UNKNOWN_HOST.to_string()
        }
    }
}
