// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-study workspace directory lifecycle

use crate::error::EngineError;
use aero_adapters::{ArgSpec, ExecRequest, Supervisor};
use aero_core::{ExecOutcome, StudyId};
use std::path::{Path, PathBuf};

/// The local directory a stage runs external programs in.
///
/// Lives at `<studiesDir>/<studyId>`; archives the worker produces sit next
/// to it, never inside it.
#[derive(Debug, Clone)]
pub struct Workspace {
    studies_dir: PathBuf,
    path: PathBuf,
}

impl Workspace {
    pub fn new(studies_dir: &Path, id: &StudyId) -> Self {
        Self {
            studies_dir: studies_dir.to_path_buf(),
            path: studies_dir.join(id.as_str()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the workspace directory (and ancestors) if absent, mode 0755.
    pub fn setup(&self) -> Result<(), EngineError> {
        std::fs::create_dir_all(&self.path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }

    /// Recursively remove the workspace via a supervised `rm -rf`, so a
    /// hanging remove stays abortable like any other child.
    pub async fn cleanup(&self, supervisor: &Supervisor) -> Result<(), EngineError> {
        if !self.path.exists() {
            return Ok(());
        }
        let req = ExecRequest::new("rm", &self.path)
            .args(vec![
                ArgSpec::opt("-rf"),
                ArgSpec::val(self.path.to_string_lossy()),
            ])
            .work_dir(self.studies_dir.to_string_lossy());
        match supervisor.run(&req).await? {
            ExecOutcome::Success { .. } => Ok(()),
            ExecOutcome::Failure(failure) => Err(EngineError::Process(failure)),
        }
    }

    /// Cleanup then setup: the stage starts from an existing, empty directory.
    pub async fn reset(&self, supervisor: &Supervisor) -> Result<(), EngineError> {
        self.cleanup(supervisor).await?;
        self.setup()
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
