// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meshing pipeline

use super::{StageRun, StudyEngine};
use crate::error::EngineError;
use aero_adapters::{archive, ArgSpec, RepoAdapter, RepoError};
use aero_core::{Stage, TaskStatus};

impl<R: RepoAdapter> StudyEngine<R> {
    pub(crate) async fn meshing_body(&self, run: &mut StageRun) -> Result<(), EngineError> {
        self.claim_running(run).await?;

        self.report(run, "download input folder").await?;
        let inputs = self
            .repo
            .children(&run.study, "cfd:inputs")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::FolderNotFound {
                node: run.study.clone(),
                node_type: "cfd:inputs".to_string(),
            })?;
        let input_zip = self.studies_dir().join(format!("{}.zip", run.id));
        self.repo.download(&inputs.node, &input_zip).await?;

        run.workspace.reset(self.supervisor()).await?;

        self.report(run, "extraction").await?;
        archive::extract_zip_flat(&input_zip, run.workspace.path())?;

        self.report(run, "meshing").await?;
        self.exec(
            run,
            "preproc",
            vec![
                ArgSpec::opt_val("-p_working", "{studyDir}").dir(),
                ArgSpec::opt_val("-p_config", "{scriptDir}/computationDict").file(),
                ArgSpec::opt_val("-np_mesh", "20"),
                ArgSpec::opt_val("-snappy_enable", "false"),
            ],
            None,
        )
        .await?;

        self.report(run, "compress").await?;
        let produced = archive::compress_stage(
            self.supervisor(),
            self.studies_dir(),
            &run.id,
            Stage::Meshing,
            run.workspace.path(),
            None,
        )
        .await?;

        // The meshing archive stays local; downstream stages read it from
        // disk rather than re-downloading it.
        let mut record = run.record.lock();
        record.archive = Some(produced);
        record.status = TaskStatus::Done;
        record.set_step("done");
        Ok(())
    }
}

#[cfg(test)]
#[path = "meshing_tests.rs"]
mod tests;
