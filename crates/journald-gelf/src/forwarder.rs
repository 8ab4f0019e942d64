// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Startup wiring: config → blacklist, mapper, transport → pipeline.

use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::blacklist::Blacklist;
use crate::config::ForwarderConfig;
use crate::errors::ForwarderError;
use crate::hostname::default_host;
use crate::mapper::FieldMapper;
use crate::pipeline::{Pipeline, PipelineStats};
use crate::scheduler::{ConnectivityProbe, DeliveryScheduler};
use crate::transport::UdpTransport;

/// Forwards every journald line read from `input` until it ends.
///
/// Fails before reading any input if the configuration is invalid or the
/// destination cannot be reached within `connect_timeout`.
pub async fn run<R: AsyncRead + Unpin>(
    config: &ForwarderConfig,
    input: R,
) -> Result<PipelineStats, ForwarderError> {
    config.validate()?;

    let blacklist = Blacklist::new(&config.blacklist)?;
    let host = default_host();
    let transport = connect(config).await?;

    info!(
        "Forwarding journald records to {}:{} ({}) with packet size {}, compression {}, default host {host:?}, blacklist {blacklist:?}",
        config.graylog_host,
        config.graylog_port,
        transport.peer(),
        config.packet_size,
        config.compression,
    );

    let pipeline = Pipeline::new(
        blacklist,
        FieldMapper::new(host, config.include_raw_line),
        DeliveryScheduler::new(transport, config.retry_strategy()),
        config,
    );

    let stats = pipeline.run(input).await?;
    info!(
        "Input closed after {} lines: {} delivered in {} datagrams, {} blacklisted, {} skipped, {} too large, {} oversized",
        stats.lines,
        stats.delivered,
        stats.datagrams,
        stats.blacklisted,
        stats.skipped,
        stats.too_large,
        stats.oversized,
    );
    Ok(stats)
}

async fn connect(config: &ForwarderConfig) -> Result<UdpTransport, ForwarderError> {
    let connect_once = || {
        UdpTransport::connect(
            &config.graylog_host,
            config.graylog_port,
            config.packet_size,
            config.compression,
        )
    };

    if config.connect_probe {
        debug!(
            "Waiting up to {:?} for {} to become reachable",
            config.connect_timeout, config.graylog_host
        );
        Ok(ConnectivityProbe::with_max_elapsed(config.connect_timeout)
            .run(connect_once)
            .await?)
    } else {
        Ok(connect_once().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConfigError, ProbeError};
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::ReadBuf;

    /// Empty input that remembers whether anyone read from it.
    #[derive(Default)]
    struct WatchedInput {
        read: AtomicBool,
    }

    impl AsyncRead for &WatchedInput {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            self.read.store(true, Ordering::SeqCst);
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_reading() {
        let config = ForwarderConfig::default();
        let err = run(&config, &b"{}\n"[..]).await.unwrap_err();
        assert!(matches!(err, ForwarderError::Config(ConfigError::MissingHost)));
    }

    #[tokio::test]
    async fn test_invalid_blacklist_fails_before_reading() {
        let config = ForwarderConfig {
            graylog_host: "127.0.0.1".to_string(),
            blacklist: "ok;(unclosed".to_string(),
            ..Default::default()
        };
        let err = run(&config, &b""[..]).await.unwrap_err();
        assert!(matches!(
            err,
            ForwarderError::Config(ConfigError::BlacklistPattern { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_input_without_probe() {
        let config = ForwarderConfig {
            graylog_host: "127.0.0.1".to_string(),
            connect_probe: false,
            ..Default::default()
        };
        let stats = run(&config, &b""[..]).await.unwrap();
        assert_eq!(stats, PipelineStats::default());
    }

    #[tokio::test]
    async fn test_unreachable_destination_stops_before_reading() {
        let config = ForwarderConfig {
            // A host name with a NUL byte never resolves.
            graylog_host: "graylog\0invalid".to_string(),
            connect_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let input = WatchedInput::default();

        let err = run(&config, &input).await.unwrap_err();
        assert!(matches!(err, ForwarderError::Probe(ProbeError::Timeout { .. })));
        assert!(!input.read.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_input_is_read_once_connected() {
        let config = ForwarderConfig {
            graylog_host: "127.0.0.1".to_string(),
            ..Default::default()
        };
        let input = WatchedInput::default();

        let stats = run(&config, &input).await.unwrap();
        assert_eq!(stats.lines, 0);
        assert!(input.read.load(Ordering::SeqCst));
    }
}
