// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Payload compression applied before chunking.
//!
//! Graylog's GELF UDP input detects GZIP and ZLIB payloads by their magic bytes,
//! so no framing is needed beyond the compressed stream itself.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use bytes::Bytes;
use flate2::write::{GzEncoder, ZlibEncoder};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    #[default]
    Zlib,
}

impl Compression {
    /// Compresses `payload`. Size limits apply to the returned bytes.
    pub fn compress(self, payload: &[u8]) -> std::io::Result<Bytes> {
        let level = flate2::Compression::default();
        match self {
            Self::None => Ok(Bytes::copy_from_slice(payload)),
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 2), level);
                encoder.write_all(payload)?;
                encoder.finish().map(Bytes::from)
            }
            Self::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2), level);
                encoder.write_all(payload)?;
                encoder.finish().map(Bytes::from)
            }
        }
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "zlib" => Ok(Self::Zlib),
            other => Err(format!("unknown compression {other:?}")),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
            Self::Zlib => write!(f, "zlib"),
        }
    }
}
