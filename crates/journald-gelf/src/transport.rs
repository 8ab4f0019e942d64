// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of GELF payloads as UDP datagrams.
//!
//! UDP is fire-and-forget: a send is complete once the datagram is handed to the
//! network layer. Nothing here waits for, or could observe, the collector
//! receiving the message.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

use crate::chunking::GelfChunker;
use crate::compression::Compression;
use crate::errors::TransportError;

/// Sends one serialized GELF payload.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends every datagram of `payload` and returns how many were sent.
    async fn send(&self, payload: &[u8]) -> Result<usize, TransportError>;
}

/// GELF over a connected UDP socket.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
    chunker: GelfChunker,
    compression: Compression,
}

impl UdpTransport {
    /// Resolves `host:port`, binds a local socket of the matching address family
    /// and connects it to the destination.
    pub async fn connect(
        host: &str,
        port: u16,
        max_datagram_size: usize,
        compression: Compression,
    ) -> Result<Self, TransportError> {
        let destination = format!("{host}:{port}");
        debug!("Resolving GELF destination {destination}");
        let peer = tokio::net::lookup_host(destination.as_str())
            .await
            .map_err(|e| TransportError::Resolve(format!("{destination}: {e}")))?
            .next()
            .ok_or_else(|| TransportError::Resolve(format!("{destination}: no addresses")))?;

        let socket = UdpSocket::bind(find_bind_address(&peer)).await?;
        socket.connect(peer).await?;
        debug!("GELF transport connected to {peer}");

        Ok(Self {
            socket,
            peer,
            chunker: GelfChunker::new(max_datagram_size),
            compression,
        })
    }

    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, payload: &[u8]) -> Result<usize, TransportError> {
        let compressed = self.compression.compress(payload)?;
        let datagrams = self.chunker.chunk(compressed)?;
        for datagram in &datagrams {
            self.socket.send(datagram).await?;
        }
        trace!(
            "Sent {} bytes in {} datagram(s) to {}",
            payload.len(),
            datagrams.len(),
            self.peer
        );
        Ok(datagrams.len())
    }
}

fn find_bind_address(remote_addr: &SocketAddr) -> SocketAddr {
    match remote_addr {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}
