// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three stage pipelines and their shared driver
//!
//! Every pipeline is a fail-fast step sequence wrapped by a finaliser that
//! always runs: the study leaves the registry and, when a claim was
//! acquired, exactly one terminal task-update goes out.

mod meshing;
mod postproc;
mod simulation;


use crate::error::EngineError;
use crate::registry::{ExecutionHandle, StudyRegistry};
use crate::workspace::Workspace;
use aero_adapters::{kill_group, ArgSpec, ExecRequest, RepoAdapter, Supervisor, SupervisorError};
use aero_core::{ExecOutcome, NodeRef, Stage, StudyId, TaskStatus};
use std::path::PathBuf;

/// Drives study stages end-to-end against the repository, the local
/// filesystem, and the external toolkit.
#[derive(Clone)]
pub struct StudyEngine<R> {
    repo: R,
    supervisor: Supervisor,
    registry: StudyRegistry,
    studies_dir: PathBuf,
}

/// Per-pipeline context threaded through the steps.
pub(crate) struct StageRun {
    stage: Stage,
    /// Registry key: the study node.
    study: NodeRef,
    /// Claim/update target: the study node, or the simulation task node.
    task: NodeRef,
    id: StudyId,
    workspace: Workspace,
    record: ExecutionHandle,
    /// True once the repository answered RUNNING to our claim.
    claimed: bool,
    /// Last status the repository answered on any call for this run.
    last_repo_status: Option<TaskStatus>,
}

impl StageRun {
    fn new(
        stage: Stage,
        study: NodeRef,
        task: NodeRef,
        record: ExecutionHandle,
        studies_dir: &std::path::Path,
    ) -> Self {
        let id = study.study_id();
        let workspace = Workspace::new(studies_dir, &id);
        Self {
            stage,
            study,
            task,
            id,
            workspace,
            record,
            claimed: false,
            last_repo_status: None,
        }
    }
}

impl<R: RepoAdapter> StudyEngine<R> {
    pub fn new(repo: R, supervisor: Supervisor, studies_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo,
            supervisor,
            registry: StudyRegistry::new(),
            studies_dir: studies_dir.into(),
        }
    }

    pub fn registry(&self) -> &StudyRegistry {
        &self.registry
    }

    // === public stage operations ===

    pub async fn run_meshing(&self, node: &NodeRef) -> Result<(), EngineError> {
        let record = self.registry.begin(node, Stage::Meshing)?;
        let mut run = StageRun::new(
            Stage::Meshing,
            node.clone(),
            node.clone(),
            record,
            &self.studies_dir,
        );
        tracing::info!(study = %node, "meshing started");
        let result = self.meshing_body(&mut run).await;
        self.finalize(run, &result).await;
        result
    }

    pub async fn abort_meshing(&self, node: &NodeRef) -> Result<(), EngineError> {
        self.abort(Stage::Meshing, node, node).await
    }

    pub async fn run_simulation(&self, study: &NodeRef, sim: &NodeRef) -> Result<(), EngineError> {
        let record = self.registry.begin(study, Stage::Simulation)?;
        let mut run = StageRun::new(
            Stage::Simulation,
            study.clone(),
            sim.clone(),
            record,
            &self.studies_dir,
        );
        tracing::info!(study = %study, sim = %sim, "simulation started");
        let result = self.simulation_body(&mut run).await;
        self.finalize(run, &result).await;
        result
    }

    pub async fn abort_simulation(&self, study: &NodeRef, sim: &NodeRef) -> Result<(), EngineError> {
        self.abort(Stage::Simulation, study, sim).await
    }

    pub async fn run_postproc(&self, node: &NodeRef) -> Result<(), EngineError> {
        let record = self.registry.begin(node, Stage::Postproc)?;
        let mut run = StageRun::new(
            Stage::Postproc,
            node.clone(),
            node.clone(),
            record,
            &self.studies_dir,
        );
        tracing::info!(study = %node, "post-processing started");
        let result = self.postproc_body(&mut run).await;
        self.finalize(run, &result).await;
        result
    }

    pub async fn abort_postproc(&self, node: &NodeRef) -> Result<(), EngineError> {
        self.abort(Stage::Postproc, node, node).await
    }

    // === shared steps ===

    /// Claim the stage task; anything but RUNNING means the task is not ours
    /// and nothing may be spawned.
    pub(crate) async fn claim_running(&self, run: &mut StageRun) -> Result<(), EngineError> {
        let info = self.repo.claim(run.stage, &run.task).await?;
        run.last_repo_status = Some(info.status);
        if info.status != TaskStatus::Running {
            return Err(EngineError::Protocol(format!(
                "claim on {} answered {} instead of RUNNING",
                run.task, info.status
            )));
        }
        run.claimed = true;
        Ok(())
    }

    /// Record the step label and push a RUNNING progress update.
    pub(crate) async fn report(&self, run: &mut StageRun, label: &str) -> Result<(), EngineError> {
        let (stdout, stderr) = {
            let mut record = run.record.lock();
            record.set_step(label);
            (record.stdout.clone(), record.stderr.clone())
        };
        tracing::info!(study = %run.study, stage = %run.stage, step = label, "step");
        let info = self
            .repo
            .update(
                run.stage,
                &run.task,
                TaskStatus::Running,
                Some(label),
                &stdout,
                &stderr,
            )
            .await?;
        run.last_repo_status = Some(info.status);
        Ok(())
    }

    /// Run one external program, exposing its process group to the record
    /// for the abort path and absorbing its output into the buffers.
    pub(crate) async fn exec(
        &self,
        run: &StageRun,
        program: &str,
        args: Vec<ArgSpec>,
        work_dir: Option<&str>,
    ) -> Result<(String, String), EngineError> {
        let mut req = ExecRequest::new(program, run.workspace.path()).args(args);
        if let Some(dir) = work_dir {
            req = req.work_dir(dir);
        }

        let child = match self.supervisor.spawn(&req).await {
            Ok(child) => child,
            Err(SupervisorError::Spawn(failure)) => {
                run.record
                    .lock()
                    .absorb_output(&failure.stdout, &failure.stderr);
                return Err(EngineError::Process(failure));
            }
            Err(other) => return Err(other.into()),
        };

        run.record.lock().pgid = Some(child.pgid());
        let outcome = child.wait().await;
        {
            let mut record = run.record.lock();
            record.pgid = None;
            record.absorb_output(outcome.stdout(), outcome.stderr());
        }

        match outcome {
            ExecOutcome::Success { stdout, stderr } => Ok((stdout, stderr)),
            ExecOutcome::Failure(failure) => Err(EngineError::Process(failure)),
        }
    }

    pub(crate) fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub(crate) fn studies_dir(&self) -> &std::path::Path {
        &self.studies_dir
    }

    /// `<studiesDir>/<id>-<stage>.7z`
    pub(crate) fn stage_archive(&self, id: &StudyId, stage: Stage) -> PathBuf {
        self.studies_dir
            .join(format!("{}-{}.7z", id, stage.archive_suffix()))
    }

    // === finalisation ===

    /// Always runs, success or failure: fold the error into stderr, settle
    /// the terminal status, release the registry entry, send the one final
    /// update if a claim was acquired.
    async fn finalize(&self, run: StageRun, result: &Result<(), EngineError>) {
        if let Err(e) = result {
            let mut record = run.record.lock();
            // Process failures already carried their diagnostics into stderr
            if !matches!(e, EngineError::Process(_)) {
                record.push_error(&e.to_string());
            }
            record.status = TaskStatus::Failed;
        }

        let (mut status, step, stdout, stderr) = {
            let record = run.record.lock();
            (
                record.status,
                record.current_step.clone(),
                record.stdout.clone(),
                record.stderr.clone(),
            )
        };

        // Bailed mid-pipeline without a terminal state: promote to FAILED
        // unless the repository already settled one.
        if status == TaskStatus::Running {
            status = match run.last_repo_status {
                Some(answered) if answered.is_terminal() => answered,
                _ => TaskStatus::Failed,
            };
        }

        // Registry first: a late abort must not find a half-finalised entry.
        self.registry.finish(&run.study);

        if !run.claimed {
            return;
        }

        let step = if step.is_empty() {
            None
        } else {
            Some(step.as_str())
        };
        match self
            .repo
            .update(run.stage, &run.task, status, step, &stdout, &stderr)
            .await
        {
            Ok(info) if info.status != status => {
                tracing::warn!(
                    task = %run.task,
                    sent = %status,
                    answered = %info.status,
                    "final update disagreement"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(task = %run.task, error = %e, "final update failed");
            }
        }
        tracing::info!(study = %run.study, stage = %run.stage, %status, "finalised");
    }

    // === abort ===

    /// Abort a running stage by signalling its child's process group.
    ///
    /// With no active execution the repository is told FAILED directly.
    /// Otherwise the in-flight pipeline observes its child dying and
    /// finalises itself; the abort path sends no update of its own.
    async fn abort(
        &self,
        stage: Stage,
        study: &NodeRef,
        task: &NodeRef,
    ) -> Result<(), EngineError> {
        let Some(record) = self.registry.get(study) else {
            tracing::info!(study = %study, %stage, "abort without active execution");
            self.repo
                .update(stage, task, TaskStatus::Failed, None, "", "user aborted")
                .await?;
            return Ok(());
        };

        let (active, pgid) = {
            let record = record.lock();
            (record.stage, record.pgid)
        };
        if active != stage {
            return Err(EngineError::WrongStep {
                requested: stage,
                active,
            });
        }

        match pgid {
            Some(pgid) => {
                tracing::info!(study = %study, %stage, pgid, "signalling process group");
                kill_group(pgid)?;
            }
            None => {
                // Between steps there is no child to signal; the pipeline is
                // uncancellable until the next spawn.
                tracing::warn!(study = %study, %stage, "abort with no live child");
            }
        }
        Ok(())
    }
}
