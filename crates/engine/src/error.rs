// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the execution engine

use aero_adapters::{ArchiveError, RepoError, SupervisorError};
use aero_core::{ExecFailure, NodeRef, Stage};
use thiserror::Error;

/// Errors that can occur while driving a stage pipeline
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stage for this study is already executing in this process.
    #[error("study {0} is already processing")]
    AlreadyProcessing(NodeRef),
    /// Abort requested for a stage other than the one running.
    #[error("abort requested for {requested} but {active} is running")]
    WrongStep { requested: Stage, active: Stage },
    /// A descriptor check failed or a table-listed program is missing;
    /// no child was spawned.
    #[error("{0}")]
    Config(String),
    /// The child exited non-zero, was killed, or never spawned.
    #[error("{}", .0.message)]
    Process(ExecFailure),
    /// Exit was clean but output matched a stage-specific fatal pattern.
    #[error("{0}")]
    Pattern(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
    /// A claim answered something other than RUNNING, or similar contract
    /// breakage. Logged at the pipeline boundary, never sent to callers.
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SupervisorError> for EngineError {
    fn from(e: SupervisorError) -> Self {
        match e {
            SupervisorError::Program(inner) => EngineError::Config(inner.to_string()),
            SupervisorError::Arg(inner) => EngineError::Config(inner.to_string()),
            SupervisorError::Spawn(failure) => EngineError::Process(failure),
        }
    }
}
