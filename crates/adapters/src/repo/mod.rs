// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content repository client
//!
//! The repository owns all authoritative task state; this worker only claims
//! tasks, streams progress updates, and moves archives in and out.

mod alfresco;
mod chunk;

pub use alfresco::AlfrescoRepo;
pub use chunk::{chunk_plan, ChunkSpec, UPLOAD_CHUNK_SIZE};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRepo, RepoCall, UpdateRecord, UploadRecord};

use aero_core::{NodeRef, Stage, TaskStatus};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Task state as reported by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskInfo {
    #[serde(rename = "nodeRef")]
    pub node: NodeRef,
    pub status: TaskStatus,
}

/// A child folder entry returned by a node-type lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChildEntry {
    #[serde(rename = "nodeRef")]
    pub node: NodeRef,
    pub name: String,
}

/// Errors from repository operations
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("permission denied")]
    PermissionDenied,
    #[error("no answer from server")]
    NoAnswer,
    #[error("unexpected repository answer (code {code})")]
    Unexpected { code: u16 },
    #[error("malformed repository payload: {0}")]
    Payload(String),
    #[error("download failed: {0}")]
    Download(String),
    #[error("no {node_type} folder under {node}")]
    FolderNotFound { node: NodeRef, node_type: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client contract against the content repository.
#[async_trait]
pub trait RepoAdapter: Clone + Send + Sync + 'static {
    /// Claim the stage task of a study. The repository must answer RUNNING
    /// for the claim to stick; any other status means the task is not ours.
    async fn claim(&self, stage: Stage, node: &NodeRef) -> Result<TaskInfo, RepoError>;

    /// Send a progress or terminal update. The returned status is
    /// authoritative and may differ from the one sent.
    async fn update(
        &self,
        stage: Stage,
        node: &NodeRef,
        status: TaskStatus,
        step: Option<&str>,
        stdout: &str,
        stderr: &str,
    ) -> Result<TaskInfo, RepoError>;

    /// Children of a node filtered by repository node type.
    async fn children(&self, node: &NodeRef, node_type: &str)
        -> Result<Vec<ChildEntry>, RepoError>;

    /// Download a folder's archive: create a session, poll until DONE,
    /// stream the content to `dest`.
    async fn download(&self, node: &NodeRef, dest: &Path) -> Result<(), RepoError>;

    /// Upload a file in 8 MiB chunks, the last one flagged.
    async fn upload(
        &self,
        node: &NodeRef,
        name: &str,
        source: &Path,
        relative_path: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<(), RepoError>;
}
