// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised execution of external programs in their own process group

use crate::args::{build_argv, ArgContext, ArgError, ArgSpec};
use aero_core::{ExecFailure, ExecOutcome, WorkerConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// A table-listed program is missing on disk (configuration error).
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("{} not found", .0.display())]
    Missing(PathBuf),
}

/// Resolves program names against the configured toolkit table.
#[derive(Debug, Clone)]
pub struct ProgramTable {
    toolkit_root: PathBuf,
    python: PathBuf,
    programs: HashMap<String, String>,
    studies_dir: PathBuf,
}

/// A resolved program: what to spawn and where its scripts live.
#[derive(Debug, Clone)]
pub struct ResolvedProgram {
    /// Executable passed to the OS.
    pub argv0: PathBuf,
    /// Tokens inserted before the caller's argv (the script path for `.py`).
    pub prepend: Vec<String>,
    /// Directory substituted for `{scriptDir}`.
    pub script_dir: PathBuf,
}

impl ProgramTable {
    pub fn new(
        toolkit_root: impl Into<PathBuf>,
        python: impl Into<PathBuf>,
        programs: HashMap<String, String>,
        studies_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            toolkit_root: toolkit_root.into(),
            python: python.into(),
            programs,
            studies_dir: studies_dir.into(),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(
            &config.toolkit.path,
            &config.toolkit.python,
            config.toolkit.programs.clone(),
            &config.studies_dir,
        )
    }

    /// Resolve a program name.
    ///
    /// Table entries become absolute toolkit paths and must exist; `.py`
    /// entries run under the configured interpreter. Unlisted names pass
    /// through verbatim (the OS resolves them on PATH) with `scriptDir`
    /// defaulting to the studies directory.
    pub fn resolve(&self, name: &str) -> Result<ResolvedProgram, ProgramError> {
        let Some(relpath) = self.programs.get(name) else {
            return Ok(ResolvedProgram {
                argv0: PathBuf::from(name),
                prepend: Vec::new(),
                script_dir: self.studies_dir.clone(),
            });
        };

        let absolute = self.toolkit_root.join(relpath);
        if !absolute.is_file() {
            return Err(ProgramError::Missing(absolute));
        }
        let script_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.toolkit_root.clone());

        if absolute.extension().is_some_and(|ext| ext == "py") {
            Ok(ResolvedProgram {
                argv0: self.python.clone(),
                prepend: vec![absolute.to_string_lossy().into_owned()],
                script_dir,
            })
        } else {
            Ok(ResolvedProgram {
                argv0: absolute,
                prepend: Vec::new(),
                script_dir,
            })
        }
    }
}

/// One external-program invocation.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub program: String,
    pub args: Vec<ArgSpec>,
    /// Workspace directory of the study; substituted for `{studyDir}` and
    /// used as the default working directory.
    pub study_dir: PathBuf,
    /// Working directory override; interpolated like argument values.
    pub work_dir: Option<String>,
}

impl ExecRequest {
    pub fn new(program: impl Into<String>, study_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            study_dir: study_dir.into(),
            work_dir: None,
        }
    }

    pub fn args(mut self, args: Vec<ArgSpec>) -> Self {
        self.args = args;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<String>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}

/// Errors from starting a supervised execution.
///
/// `Program` and `Arg` are configuration errors: validation failed before any
/// child existed. `Spawn` carries the synthetic `-127` failure payload.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Arg(#[from] ArgError),
    #[error("{}", .0.message)]
    Spawn(ExecFailure),
}

/// Spawns external programs and supervises their lifetime.
#[derive(Debug, Clone)]
pub struct Supervisor {
    table: ProgramTable,
}

impl Supervisor {
    pub fn new(table: ProgramTable) -> Self {
        Self { table }
    }

    /// Resolve, validate, and spawn; the returned child exposes its process
    /// group for abort and `wait()` for the outcome.
    pub async fn spawn(&self, req: &ExecRequest) -> Result<SupervisedChild, SupervisorError> {
        let resolved = self.table.resolve(&req.program)?;
        let ctx = ArgContext {
            study_dir: req.study_dir.clone(),
            script_dir: resolved.script_dir.clone(),
        };
        let argv = build_argv(&req.args, &ctx)?;
        let work_dir = match &req.work_dir {
            Some(dir) => PathBuf::from(ctx.interpolate(dir)),
            None => req.study_dir.clone(),
        };

        let mut cmd = Command::new(&resolved.argv0);
        cmd.args(&resolved.prepend)
            .args(&argv)
            .current_dir(&work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so one signal reaches the child and its
        // descendants.
        #[cfg(unix)]
        cmd.process_group(0);

        tracing::info!(
            program = %req.program,
            argv0 = %resolved.argv0.display(),
            work_dir = %work_dir.display(),
            args = ?argv,
            "spawning"
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| SupervisorError::Spawn(ExecFailure::spawn(&req.program, e)))?;

        let pgid = child.id().map(|id| id as i32).unwrap_or(-1);
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = capture(stdout, req.program.clone(), false);
        let stderr_task = capture(stderr, req.program.clone(), true);

        Ok(SupervisedChild {
            program: req.program.clone(),
            pgid,
            child,
            stdout_task,
            stderr_task,
        })
    }

    /// Spawn and wait in one step, folding spawn failures into the outcome.
    pub async fn run(&self, req: &ExecRequest) -> Result<ExecOutcome, SupervisorError> {
        match self.spawn(req).await {
            Ok(child) => Ok(child.wait().await),
            Err(SupervisorError::Spawn(failure)) => Ok(ExecOutcome::Failure(failure)),
            Err(e) => Err(e),
        }
    }
}

/// Drain a child stream line-by-line, mirroring to the logger as lines arrive.
fn capture<R>(reader: Option<R>, program: String, is_stderr: bool) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(reader) = reader else {
            return String::new();
        };
        let mut buf = String::new();
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                tracing::warn!(program = %program, "{}", line);
            } else {
                tracing::info!(program = %program, "{}", line);
            }
            buf.push_str(&line);
            buf.push('\n');
        }
        buf
    })
}

/// A spawned child under supervision.
pub struct SupervisedChild {
    program: String,
    pgid: i32,
    child: tokio::process::Child,
    stdout_task: JoinHandle<String>,
    stderr_task: JoinHandle<String>,
}

impl SupervisedChild {
    /// Process-group id (equals the child's pid: spawned with pgid 0).
    pub fn pgid(&self) -> i32 {
        self.pgid
    }

    /// Wait for exit and the capture tasks, then classify.
    pub async fn wait(mut self) -> ExecOutcome {
        let status = self.child.wait().await;
        let stdout = self.stdout_task.await.unwrap_or_default();
        let mut stderr = self.stderr_task.await.unwrap_or_default();

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                let failure = ExecFailure::spawn(&self.program, e);
                return ExecOutcome::Failure(failure);
            }
        };

        if status.success() {
            return ExecOutcome::Success { stdout, stderr };
        }

        let code = status.code();
        let signal = {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                status.signal()
            }
            #[cfg(not(unix))]
            {
                None
            }
        };

        let mut lines = Vec::new();
        if let Some(code) = code {
            lines.push(format!("{} exited with code {}", self.program, code));
        }
        if let Some(signal) = signal {
            lines.push(format!("{} killed by signal {}", self.program, signal));
        }
        let message = lines.join("\n");
        if !stderr.is_empty() && !stderr.ends_with('\n') {
            stderr.push('\n');
        }
        stderr.push_str(&message);

        ExecOutcome::Failure(ExecFailure {
            code,
            signal,
            stdout,
            stderr,
            message,
        })
    }
}

/// Send SIGTERM to a whole process group.
pub fn kill_group(pgid: i32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        killpg(Pid::from_raw(pgid), Signal::SIGTERM).map_err(std::io::Error::from)
    }
    #[cfg(not(unix))]
    {
        let _ = pgid;
        Err(std::io::Error::other("process groups are unix-only"))
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
