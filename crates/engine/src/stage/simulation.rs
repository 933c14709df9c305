// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulation pipeline

use super::{StageRun, StudyEngine};
use crate::error::EngineError;
use aero_adapters::{archive, ArgSpec, RepoAdapter};
use aero_core::{Stage, TaskStatus};
use regex::Regex;
use std::sync::LazyLock;

/// Solver output lines that demote a clean exit to FAILED.
static SOLVER_FATAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("FOAM FATAL ERROR|a divergé|commande introuvable").expect("static pattern")
});

impl<R: RepoAdapter> StudyEngine<R> {
    pub(crate) async fn simulation_body(&self, run: &mut StageRun) -> Result<(), EngineError> {
        self.claim_running(run).await?;

        run.workspace.reset(self.supervisor()).await?;

        self.report(run, "uncompress").await?;
        let meshing_archive = self.stage_archive(&run.id, Stage::Meshing);
        archive::uncompress(self.supervisor(), &meshing_archive, run.workspace.path()).await?;

        self.report(run, "simulation").await?;
        let (stdout, stderr) = self
            .exec(
                run,
                "simulation",
                vec![
                    ArgSpec::opt_val("-p", "{studyDir}").dir(),
                    ArgSpec::opt_val("-e", run.id.as_str()),
                    ArgSpec::opt_val("-n", "30"),
                    ArgSpec::opt_val("-s", "1.5"),
                ],
                None,
            )
            .await?;

        // A solver can diverge and still exit 0; the output is authoritative.
        let combined = format!("{stdout}\n{stderr}");
        {
            let mut record = run.record.lock();
            if SOLVER_FATAL.is_match(&combined) {
                tracing::warn!(study = %run.study, "solver output matched fatal pattern");
                record.status = TaskStatus::Failed;
            } else {
                record.status = TaskStatus::Done;
            }
        }

        // The result archive is produced either way; a diverged run is still
        // worth inspecting.
        self.report(run, "compressing").await?;
        let produced = archive::compress_stage(
            self.supervisor(),
            self.studies_dir(),
            &run.id,
            Stage::Simulation,
            run.workspace.path(),
            None,
        )
        .await?;
        run.record.lock().archive = Some(produced);
        Ok(())
    }
}

#[cfg(test)]
#[path = "simulation_tests.rs"]
mod tests;
