// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration (TOML file + environment overrides)

use crate::id::StudyId;
use crate::stage::Stage;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level worker configuration.
///
/// Loaded from a TOML file (`WORKER_CONFIG_FILE`, default `worker.toml`),
/// then overridden by `WORKER_ROOT_DIR`, `WORKER_STUDIES_DIR` and
/// `WORKER_BIN_DIR`. Relative `studies_dir`/`bin_dir` resolve against
/// `root_dir`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    #[serde(default = "default_studies_dir")]
    pub studies_dir: PathBuf,
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,
    pub alfresco: AlfrescoConfig,
    pub activemq: ActiveMqConfig,
    pub toolkit: ToolkitConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
}

/// Content repository endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct AlfrescoConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Message bus endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveMqConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// External program toolkit: root directory, interpreter, program table.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolkitConfig {
    /// Root under which table entries are resolved.
    pub path: PathBuf,
    /// Interpreter substituted for `.py` programs.
    #[serde(default = "default_python")]
    pub python: PathBuf,
    /// Program name → relative path under `path`.
    #[serde(default)]
    pub programs: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_studies_dir() -> PathBuf {
    PathBuf::from("studies")
}

fn default_bin_dir() -> PathBuf {
    PathBuf::from("bin")
}

fn default_python() -> PathBuf {
    PathBuf::from("python3")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WorkerConfig {
    /// Load from `WORKER_CONFIG_FILE` (default `worker.toml`), apply
    /// environment overrides, resolve relative directories.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WORKER_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("worker.toml"));
        Self::from_path(&path)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: WorkerConfig = toml::from_str(&text)?;
        config.apply_env();
        config.resolve();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("WORKER_ROOT_DIR") {
            self.root_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("WORKER_STUDIES_DIR") {
            self.studies_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("WORKER_BIN_DIR") {
            self.bin_dir = PathBuf::from(dir);
        }
    }

    fn resolve(&mut self) {
        if self.studies_dir.is_relative() {
            self.studies_dir = self.root_dir.join(&self.studies_dir);
        }
        if self.bin_dir.is_relative() {
            self.bin_dir = self.root_dir.join(&self.bin_dir);
        }
    }

    /// Local workspace directory for a study.
    pub fn study_workspace(&self, id: &StudyId) -> PathBuf {
        self.studies_dir.join(id.as_str())
    }

    /// Downloaded input archive (`<id>.zip`), next to the workspace.
    pub fn input_zip(&self, id: &StudyId) -> PathBuf {
        self.studies_dir.join(format!("{}.zip", id))
    }

    /// Downloaded post-processing inputs (`<id>-postprocInputs.zip`).
    pub fn postproc_inputs_zip(&self, id: &StudyId) -> PathBuf {
        self.studies_dir.join(format!("{}-postprocInputs.zip", id))
    }

    /// Stage result archive (`<id>-<stage>.7z`), next to the workspace.
    pub fn stage_archive(&self, id: &StudyId, stage: Stage) -> PathBuf {
        self.studies_dir
            .join(format!("{}-{}.7z", id, stage.archive_suffix()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
