// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake bus for deterministic testing

use super::{BusConsumer, BusError};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Fake bus fed by a channel; `next()` yields pushed frames and reports a
/// clean close once the sender is dropped.
pub struct FakeBus {
    rx: mpsc::UnboundedReceiver<String>,
}

impl FakeBus {
    /// A bus plus the handle used to inject frames.
    pub fn channel() -> (mpsc::UnboundedSender<String>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// A pre-loaded bus that closes after the given frames.
    pub fn with_frames(frames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let (tx, bus) = Self::channel();
        for frame in frames {
            let _ = tx.send(frame.into());
        }
        bus
    }
}

#[async_trait]
impl BusConsumer for FakeBus {
    async fn next(&mut self) -> Result<Option<String>, BusError> {
        Ok(self.rx.recv().await)
    }
}
