// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository task status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a repository task.
///
/// A task transitions `TODO → PENDING → RUNNING → {DONE, FAILED}`. Only the
/// `RUNNING → {DONE, FAILED}` edge is driven by this worker; the earlier
/// transitions happen repository-side. A claim that returns anything other
/// than `Running` means the task is not ours to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Todo,
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    /// Whether this status ends the task's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "TODO"),
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::Running => write!(f, "RUNNING"),
            TaskStatus::Done => write!(f, "DONE"),
            TaskStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
