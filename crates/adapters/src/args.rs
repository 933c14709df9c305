// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed argument descriptors expanded into a validated argv

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filesystem check applied to an argument value before spawning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Value must be an existing directory (creatable on demand).
    Dir,
    /// Value must be an existing regular file.
    File,
}

/// One argument descriptor: a literal option, a positional value, or an
/// option followed by its value.
///
/// Values are interpolated before validation: `{studyDir}` and `{scriptDir}`
/// are replaced by the absolute workspace and program directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub opt: Option<String>,
    pub val: Option<String>,
    pub kind: Option<PathKind>,
    pub create_if_missing: bool,
}

impl ArgSpec {
    /// A bare option token (`-r`, `-snappy_enable`, ...).
    pub fn opt(flag: impl Into<String>) -> Self {
        Self {
            opt: Some(flag.into()),
            val: None,
            kind: None,
            create_if_missing: false,
        }
    }

    /// A bare positional value.
    pub fn val(value: impl Into<String>) -> Self {
        Self {
            opt: None,
            val: Some(value.into()),
            kind: None,
            create_if_missing: false,
        }
    }

    /// An option immediately followed by its value.
    pub fn opt_val(flag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            opt: Some(flag.into()),
            val: Some(value.into()),
            kind: None,
            create_if_missing: false,
        }
    }

    /// Require the value to designate an existing directory.
    pub fn dir(mut self) -> Self {
        self.kind = Some(PathKind::Dir);
        self
    }

    /// Require the value to designate an existing regular file.
    pub fn file(mut self) -> Self {
        self.kind = Some(PathKind::File);
        self
    }

    /// With `dir()`: create the directory (and ancestors) when missing.
    pub fn or_create(mut self) -> Self {
        self.create_if_missing = true;
        self
    }
}

/// Interpolation context for argument values.
#[derive(Debug, Clone)]
pub struct ArgContext {
    pub study_dir: PathBuf,
    pub script_dir: PathBuf,
}

impl ArgContext {
    pub fn interpolate(&self, value: &str) -> String {
        value
            .replace("{studyDir}", &self.study_dir.to_string_lossy())
            .replace("{scriptDir}", &self.script_dir.to_string_lossy())
    }
}

/// A descriptor failed validation: configuration error, no child is spawned.
#[derive(Debug, Error)]
pub enum ArgError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Expand descriptors, in order, into argv tokens, validating paths.
pub fn build_argv(specs: &[ArgSpec], ctx: &ArgContext) -> Result<Vec<String>, ArgError> {
    let mut argv = Vec::new();
    for spec in specs {
        if let Some(opt) = &spec.opt {
            argv.push(opt.clone());
        }
        if let Some(val) = &spec.val {
            let value = ctx.interpolate(val);
            if let Some(kind) = spec.kind {
                check_path(Path::new(&value), kind, spec.create_if_missing)?;
            }
            argv.push(value);
        }
    }
    Ok(argv)
}

fn check_path(path: &Path, kind: PathKind, create_if_missing: bool) -> Result<(), ArgError> {
    match kind {
        PathKind::Dir => {
            if path.is_dir() {
                return Ok(());
            }
            if path.exists() {
                return Err(ArgError::NotADirectory(path.to_path_buf()));
            }
            if !create_if_missing {
                return Err(ArgError::NotFound(path.to_path_buf()));
            }
            std::fs::create_dir_all(path).map_err(|source| ArgError::Create {
                path: path.to_path_buf(),
                source,
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(
                    |source| ArgError::Create {
                        path: path.to_path_buf(),
                        source,
                    },
                )?;
            }
            Ok(())
        }
        PathKind::File => {
            if path.is_file() {
                Ok(())
            } else {
                Err(ArgError::NotFound(path.to_path_buf()))
            }
        }
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
