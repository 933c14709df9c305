// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command dispatcher: bus frames → stage pipelines

use std::sync::Arc;
use std::time::Duration;

use aero_adapters::{BusConsumer, BusError, RepoAdapter};
use aero_core::Command;
use aero_engine::{EngineError, StudyEngine};

/// Queue all worker commands arrive on.
pub const COMMAND_QUEUE: &str = "/queue/simulation";

/// Grace period before acting on a `start-*` command, so the repository can
/// finish publishing the freshly-created task node.
pub const START_DELAY: Duration = Duration::from_millis(2000);

/// Parses command frames and triggers the right engine operation, each in
/// its own task so pipelines for different studies interleave.
pub struct Dispatcher<R: RepoAdapter> {
    engine: Arc<StudyEngine<R>>,
}

impl<R: RepoAdapter> Dispatcher<R> {
    pub fn new(engine: Arc<StudyEngine<R>>) -> Self {
        Self { engine }
    }

    /// Consume frames until the bus closes. Malformed and unknown frames are
    /// logged and dropped; the dispatcher never crashes the worker.
    pub async fn run(&self, mut bus: impl BusConsumer) -> Result<(), BusError> {
        loop {
            match bus.next().await? {
                Some(frame) => self.handle_frame(&frame),
                None => return Ok(()),
            }
        }
    }

    pub(crate) fn handle_frame(&self, frame: &str) {
        match Command::parse(frame) {
            Ok(Some(command)) => self.dispatch(command),
            Ok(None) => tracing::warn!(frame, "ignoring unknown command"),
            Err(e) => tracing::error!(error = %e, frame, "discarding malformed frame"),
        }
    }

    fn dispatch(&self, command: Command) {
        tracing::info!(?command, "dispatching");
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if command.is_start() {
                tokio::time::sleep(START_DELAY).await;
            }
            let result = match &command {
                Command::StartMeshing { node } => engine.run_meshing(node).await,
                Command::AbortMeshing { node } => engine.abort_meshing(node).await,
                Command::StartSimulation { node, sim } => engine.run_simulation(node, sim).await,
                Command::AbortSimulation { node, sim } => engine.abort_simulation(node, sim).await,
                Command::StartPostproc { node } => engine.run_postproc(node).await,
                Command::AbortPostproc { node } => engine.abort_postproc(node).await,
            };
            match result {
                Ok(()) => {}
                // Expected contention, not worth an error-level entry
                Err(EngineError::AlreadyProcessing(node)) => {
                    tracing::warn!(study = %node, "study already processing");
                }
                Err(e) => tracing::error!(?command, error = %e, "command failed"),
            }
        });
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
