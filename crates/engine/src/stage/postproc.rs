// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-processing pipeline

use super::{StageRun, StudyEngine};
use crate::error::EngineError;
use aero_adapters::{archive, ArgSpec, RepoAdapter, RepoError};
use aero_core::{Stage, TaskStatus};

impl<R: RepoAdapter> StudyEngine<R> {
    pub(crate) async fn postproc_body(&self, run: &mut StageRun) -> Result<(), EngineError> {
        self.claim_running(run).await?;

        run.workspace.reset(self.supervisor()).await?;

        self.report(run, "uncompress").await?;
        let simulation_archive = self.stage_archive(&run.id, Stage::Simulation);
        archive::uncompress(self.supervisor(), &simulation_archive, run.workspace.path()).await?;

        let inputs = self
            .repo
            .children(&run.study, "cfd:postproc_inputs")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::FolderNotFound {
                node: run.study.clone(),
                node_type: "cfd:postproc_inputs".to_string(),
            })?;
        let inputs_zip = self
            .studies_dir()
            .join(format!("{}-postprocInputs.zip", run.id));
        self.repo.download(&inputs.node, &inputs_zip).await?;

        self.report(run, "extraction").await?;
        archive::extract_zip_flat(&inputs_zip, run.workspace.path())?;

        self.report(run, "emiCalc").await?;
        let (_, stderr) = self
            .exec(
                run,
                "emiCalc",
                vec![
                    ArgSpec::opt_val("-p_input", "{studyDir}").dir(),
                    ArgSpec::opt_val("-p_output", "{studyDir}/emiCalc").dir().or_create(),
                ],
                Some("{scriptDir}"),
            )
            .await?;
        // emiCalc exits 0 even when its indexing blew up
        if stderr.contains("IndexError:") {
            return Err(EngineError::Pattern("emicalc failed.".to_string()));
        }

        self.report(run, "meanAndConcat").await?;
        self.exec(
            run,
            "meanAndConcat",
            vec![
                ArgSpec::opt_val("-p_working", "{studyDir}").dir(),
                ArgSpec::opt_val("-p_output", "{studyDir}/probes_treated")
                    .dir()
                    .or_create(),
            ],
            None,
        )
        .await?;

        self.report(run, "probesMeanYear").await?;
        self.exec(
            run,
            "probesMeanYear",
            vec![
                ArgSpec::opt_val("-p_working", "{studyDir}").dir(),
                ArgSpec::opt_val("-p_probes_treated", "{studyDir}/probes_treated").dir(),
                ArgSpec::opt_val("-p_freq", "{studyDir}/frequencesVent").file(),
                ArgSpec::opt_val("-p_sigmo", "{studyDir}/parametresSigmoide").file(),
                ArgSpec::opt_val("-p_config", "{scriptDir}/config").file(),
            ],
            None,
        )
        .await?;

        self.report(run, "polluant").await?;
        self.exec(
            run,
            "polluant",
            vec![
                ArgSpec::opt_val("-p_scale", "{studyDir}/settings_for_images").file(),
                ArgSpec::opt_val("-p_logo", "{scriptDir}/Logo_airetd.png").file(),
                ArgSpec::opt_val("-p_treated_data", "{studyDir}/probes_treated").dir(),
            ],
            None,
        )
        .await?;

        self.report(run, "compress").await?;
        let produced = archive::compress_stage(
            self.supervisor(),
            self.studies_dir(),
            &run.id,
            Stage::Postproc,
            run.workspace.path(),
            Some(vec![
                ArgSpec::val("{studyDir}/emiCalc").dir(),
                ArgSpec::val("{studyDir}/probes_treated").dir(),
            ]),
        )
        .await?;
        run.record.lock().archive = Some(produced.clone());

        self.report(run, "uploading").await?;
        self.repo
            .upload(
                &run.study,
                "final-results.7z",
                &produced,
                Some("${cfd.postproc}"),
                Some("cfd:postproc_result"),
            )
            .await?;

        run.record.lock().status = TaskStatus::Done;
        Ok(())
    }
}

#[cfg(test)]
#[path = "postproc_tests.rs"]
mod tests;
