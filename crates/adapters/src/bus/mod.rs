// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message bus consumption
//!
//! Commands arrive as JSON text frames on a single queue. Delivery is
//! at-least-once; duplicates are harmless because both the active-study
//! registry and the repository claim reject a second start.

mod stomp;

pub use stomp::StompConsumer;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBus;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the bus connection
#[derive(Debug, Error)]
pub enum BusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("connection closed")]
    ConnectionClosed,
}

/// A source of raw command frames.
#[async_trait]
pub trait BusConsumer: Send {
    /// Next message body; `None` when the connection closed cleanly.
    async fn next(&mut self) -> Result<Option<String>, BusError>;
}
