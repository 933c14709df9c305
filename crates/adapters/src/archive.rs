// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive creation and extraction (zip stream + external 7z)

use crate::args::ArgSpec;
use crate::subprocess::{ExecRequest, Supervisor, SupervisorError};
use aero_core::{ExecOutcome, Stage, StudyId};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot open archive {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read archive {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("cannot extract {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("archiver failed: {0}")]
    Tool(String),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Extract a zip archive into `dest`, flattening the entry hierarchy.
///
/// Every file entry is written under `dest` by basename only; directory
/// entries produce nothing. Returns the number of files written.
pub fn extract_zip_flat(archive: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive).map_err(|source| ArchiveError::Open {
        path: archive.to_path_buf(),
        source,
    })?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| ArchiveError::Zip {
        path: archive.to_path_buf(),
        source,
    })?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|source| ArchiveError::Zip {
            path: archive.to_path_buf(),
            source,
        })?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let basename = name.rsplit(['/', '\\']).next().unwrap_or(&name);
        if basename.is_empty() {
            continue;
        }
        let target = dest.join(basename);
        let mut out = File::create(&target).map_err(|source| ArchiveError::Entry {
            name: name.clone(),
            source,
        })?;
        io::copy(&mut entry, &mut out).map_err(|source| ArchiveError::Entry { name, source })?;
        written += 1;
    }

    tracing::info!(
        archive = %archive.display(),
        dest = %dest.display(),
        files = written,
        "extracted"
    );
    Ok(written)
}

/// Create the stage archive `<studies>/<id>-<stage>.7z`.
///
/// Any previous archive for the stage is deleted first. With no `targets`
/// the whole workspace is archived; otherwise only the given descriptors
/// (interpolated against the workspace) are.
pub async fn compress_stage(
    supervisor: &Supervisor,
    studies_dir: &Path,
    study_id: &StudyId,
    stage: Stage,
    workspace: &Path,
    targets: Option<Vec<ArgSpec>>,
) -> Result<PathBuf, ArchiveError> {
    let archive = studies_dir.join(format!("{}-{}.7z", study_id, stage.archive_suffix()));
    if archive.exists() {
        std::fs::remove_file(&archive)?;
    }

    let mut args = vec![
        ArgSpec::opt("a"),
        ArgSpec::opt("-r"),
        ArgSpec::val(archive.to_string_lossy()),
    ];
    match targets {
        Some(targets) => args.extend(targets),
        None => args.push(ArgSpec::val(workspace.to_string_lossy())),
    }

    let req = ExecRequest::new("7z", workspace)
        .args(args)
        .work_dir(studies_dir.to_string_lossy());
    match supervisor.run(&req).await? {
        ExecOutcome::Success { .. } => Ok(archive),
        ExecOutcome::Failure(failure) => Err(ArchiveError::Tool(failure.message)),
    }
}

/// Unpack a stage archive into the workspace with `7z x`.
pub async fn uncompress(
    supervisor: &Supervisor,
    archive: &Path,
    workspace: &Path,
) -> Result<(), ArchiveError> {
    let req = ExecRequest::new("7z", workspace)
        .args(vec![
            ArgSpec::opt("x"),
            ArgSpec::val(archive.to_string_lossy()),
        ])
        .work_dir(workspace.to_string_lossy());
    match supervisor.run(&req).await? {
        ExecOutcome::Success { .. } => Ok(()),
        ExecOutcome::Failure(failure) => Err(ArchiveError::Tool(failure.message)),
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
