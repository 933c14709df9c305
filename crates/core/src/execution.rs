// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage execution state and external-program outcomes

use crate::stage::Stage;
use crate::task::TaskStatus;
use std::path::PathBuf;

/// Outcome of one supervised external-program run.
///
/// Termination by signal, a non-zero exit code, and spawn failure are all
/// `Failure`; content-pattern scans that demote a zero-exit run are applied
/// by the pipelines on top of `Success`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Success { stdout: String, stderr: String },
    Failure(ExecFailure),
}

impl ExecOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecOutcome::Success { .. })
    }

    /// Captured stdout, whichever way the run ended.
    pub fn stdout(&self) -> &str {
        match self {
            ExecOutcome::Success { stdout, .. } => stdout,
            ExecOutcome::Failure(f) => &f.stdout,
        }
    }

    /// Captured stderr, whichever way the run ended.
    pub fn stderr(&self) -> &str {
        match self {
            ExecOutcome::Success { stderr, .. } => stderr,
            ExecOutcome::Failure(f) => &f.stderr,
        }
    }
}

/// Failure payload of a supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecFailure {
    /// Exit code, if the process exited. `-127` for spawn failures.
    pub code: Option<i32>,
    /// Terminating signal, if killed.
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub message: String,
}

impl ExecFailure {
    /// Synthetic failure for a child that never spawned.
    pub fn spawn(program: &str, err: impl std::fmt::Display) -> Self {
        let message = format!("failed to spawn {}: {}", program, err);
        Self {
            code: Some(-127),
            signal: None,
            stdout: String::new(),
            stderr: message.clone(),
            message,
        }
    }
}

impl std::fmt::Display for ExecFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// State of the one stage currently executing for a study.
///
/// Lives in the active-study registry for the duration of a pipeline and is
/// shared with the abort path, which only reads `stage` and `pgid`.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub stage: Stage,
    pub status: TaskStatus,
    /// Short human-readable label of the step in progress.
    pub current_step: String,
    /// Accumulated stdout of every child run so far in this stage.
    pub stdout: String,
    /// Accumulated stderr, plus folded-in error diagnostics.
    pub stderr: String,
    /// Process-group id of the most recently spawned child, while alive.
    pub pgid: Option<i32>,
    /// Archive produced by the stage's compress step, once it exists.
    pub archive: Option<PathBuf>,
}

impl ExecutionRecord {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            status: TaskStatus::Running,
            current_step: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            pgid: None,
            archive: None,
        }
    }

    pub fn set_step(&mut self, label: impl Into<String>) {
        self.current_step = label.into();
    }

    /// Append a child's captured output to the accumulated buffers.
    pub fn absorb_output(&mut self, stdout: &str, stderr: &str) {
        self.append(true, stdout);
        self.append(false, stderr);
    }

    /// Fold an error diagnostic into the accumulated stderr.
    pub fn push_error(&mut self, message: &str) {
        self.append(false, message);
    }

    fn append(&mut self, to_stdout: bool, text: &str) {
        if text.is_empty() {
            return;
        }
        let buf = if to_stdout {
            &mut self.stdout
        } else {
            &mut self.stderr
        };
        if !buf.is_empty() && !buf.ends_with('\n') {
            buf.push('\n');
        }
        buf.push_str(text);
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
