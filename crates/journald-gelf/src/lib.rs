// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards journald JSON records to a Graylog GELF UDP input.
//!
//! Each line read from the input is checked against the blacklist, mapped from
//! journald fields to a GELF message, compressed, chunked when it does not fit in
//! one datagram, and sent before the next line is read.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod blacklist;
pub mod chunking;
pub mod compression;
pub mod config;
pub mod errors;
pub mod forwarder;
pub mod gelf;
pub mod hostname;
pub mod journald;
pub mod mapper;
pub mod pipeline;
pub mod scheduler;
pub mod transport;
