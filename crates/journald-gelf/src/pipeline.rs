// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The per-line forwarding loop: read → blacklist → map → deliver.
//!
//! Lines are handled one at a time; the next line is only read once the previous
//! one has been dropped or handed to the network. Lost records (bad JSON, bad
//! `CODE_LINE`, oversized lines, messages too large to chunk) are logged and
//! counted; everything else that goes wrong stops the loop.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};
use tracing::{debug, error, trace, warn};

use crate::blacklist::Blacklist;
use crate::config::ForwarderConfig;
use crate::errors::{DeliveryError, ForwarderError, LineError};
use crate::mapper::FieldMapper;
use crate::scheduler::DeliveryScheduler;
use crate::transport::Transport;

const READ_BUFFER_SIZE: usize = 8192;

/// Splits a byte stream into `\n`-terminated lines of bounded length.
pub struct LineReader<R> {
    input: R,
    codec: AnyDelimiterCodec,
    buffer: BytesMut,
    max_line_size: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(input: R, max_line_size: usize) -> Self {
        Self {
            input,
            codec: AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), max_line_size),
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            max_line_size,
            eof: false,
        }
    }

    /// Returns the next line without its terminator, or `None` at end of stream.
    ///
    /// A line longer than `max_line_size` yields [`LineError::Overflow`] once; the
    /// rest of it is discarded and reading continues with the following line.
    pub async fn next_line(&mut self) -> Option<Result<Bytes, LineError>> {
        loop {
            let decoded = if self.eof {
                self.codec.decode_eof(&mut self.buffer)
            } else {
                self.codec.decode(&mut self.buffer)
            };

            match decoded {
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) if self.eof => return None,
                Ok(None) => {}
                Err(AnyDelimiterCodecError::Io(e)) => return Some(Err(LineError::Io(e))),
                Err(_) => {
                    return Some(Err(LineError::Overflow {
                        max: self.max_line_size,
                    }))
                }
            }

            self.buffer.reserve(READ_BUFFER_SIZE);
            match self.input.read_buf(&mut self.buffer).await {
                Ok(0) => self.eof = true,
                Ok(_) => {}
                Err(e) => return Some(Err(LineError::Io(e))),
            }
        }
    }
}

/// What happened to a single input line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// Empty or whitespace only.
    Blank,
    /// Matched the blacklist.
    Blacklisted,
    /// Could not be mapped to GELF (bad JSON or bad `CODE_LINE`).
    Skipped,
    /// Mapped, but too large for the GELF chunk limit.
    TooLarge,
    Delivered { datagrams: usize },
}

/// Counters for one run of the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub lines: u64,
    pub blank: u64,
    pub delivered: u64,
    pub datagrams: u64,
    pub blacklisted: u64,
    pub skipped: u64,
    pub too_large: u64,
    pub oversized: u64,
}

pub struct Pipeline<T> {
    blacklist: Blacklist,
    mapper: FieldMapper,
    scheduler: DeliveryScheduler<T>,
    max_line_size: usize,
    verbose: bool,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(
        blacklist: Blacklist,
        mapper: FieldMapper,
        scheduler: DeliveryScheduler<T>,
        config: &ForwarderConfig,
    ) -> Self {
        Self {
            blacklist,
            mapper,
            scheduler,
            max_line_size: config.max_line_size,
            verbose: config.verbose,
        }
    }

    /// Reads `input` until end of stream, forwarding every line.
    ///
    /// Returns the run counters, or the first fatal error.
    pub async fn run<R: AsyncRead + Unpin>(
        &self,
        input: R,
    ) -> Result<PipelineStats, ForwarderError> {
        let mut lines = LineReader::new(input, self.max_line_size);
        let mut stats = PipelineStats::default();

        while let Some(next) = lines.next_line().await {
            stats.lines += 1;
            let line = match next {
                Ok(line) => line,
                Err(LineError::Overflow { max }) => {
                    warn!("Got a log line bigger than the {max} bytes line buffer, it will be skipped");
                    stats.oversized += 1;
                    continue;
                }
                Err(LineError::Io(e)) => return Err(ForwarderError::Input(e)),
            };

            match self.process_line(&line).await? {
                LineOutcome::Blank => stats.blank += 1,
                LineOutcome::Blacklisted => stats.blacklisted += 1,
                LineOutcome::Skipped => stats.skipped += 1,
                LineOutcome::TooLarge => stats.too_large += 1,
                LineOutcome::Delivered { datagrams } => {
                    stats.delivered += 1;
                    stats.datagrams += datagrams as u64;
                }
            }
        }

        debug!("Reached end of input");
        Ok(stats)
    }

    /// Filters, maps and delivers one line.
    pub async fn process_line(&self, line: &[u8]) -> Result<LineOutcome, ForwarderError> {
        if line.iter().all(u8::is_ascii_whitespace) {
            trace!("Ignoring blank log line");
            return Ok(LineOutcome::Blank);
        }

        if self.blacklist.matches(line) {
            trace!("Log line matched the blacklist");
            return Ok(LineOutcome::Blacklisted);
        }

        let payload = match self.mapper.map(line) {
            Ok(payload) => payload,
            Err(e) if e.is_fatal() => {
                error!("{e}: {:?}", String::from_utf8_lossy(line));
                return Err(e.into());
            }
            Err(e) => {
                warn!(
                    "{e}, it will be skipped: {:?}",
                    String::from_utf8_lossy(line)
                );
                return Ok(LineOutcome::Skipped);
            }
        };

        if self.verbose {
            debug!("{}", String::from_utf8_lossy(&payload));
        }

        match self.scheduler.send(&payload).await {
            Ok(datagrams) => Ok(LineOutcome::Delivered { datagrams }),
            Err(e @ DeliveryError::MessageTooLarge(_)) => {
                error!("{e}, the log line will be dropped");
                Ok(LineOutcome::TooLarge)
            }
            Err(e) => Err(e.into()),
        }
    }
}
