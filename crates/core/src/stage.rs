// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution stages of a study

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three externally-executed stages a study moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Meshing,
    Simulation,
    Postproc,
}

impl Stage {
    /// Suffix used in produced archive names (`<id>-<suffix>.7z`).
    pub fn archive_suffix(&self) -> &'static str {
        match self {
            Stage::Meshing => "meshing",
            Stage::Simulation => "simulation",
            Stage::Postproc => "postproc",
        }
    }

    /// Path segment used in repository task endpoints.
    pub fn task_path(&self) -> &'static str {
        self.archive_suffix()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.archive_suffix())
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
