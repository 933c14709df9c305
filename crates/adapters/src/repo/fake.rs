// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake repository adapter for deterministic testing

use super::{ChildEntry, RepoAdapter, RepoError, TaskInfo};
use aero_core::{NodeRef, Stage, TaskStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded call to FakeRepo
#[derive(Debug, Clone)]
pub enum RepoCall {
    Claim { stage: Stage, node: NodeRef },
    Update { stage: Stage, node: NodeRef },
    Children { node: NodeRef, node_type: String },
    Download { node: NodeRef, dest: PathBuf },
    Upload { node: NodeRef, name: String },
}

/// Full payload of a recorded update
#[derive(Debug, Clone)]
pub struct UpdateRecord {
    pub stage: Stage,
    pub node: NodeRef,
    pub status: TaskStatus,
    pub step: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

/// Full payload of a recorded upload
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub node: NodeRef,
    pub name: String,
    pub source: PathBuf,
    pub relative_path: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
}

/// Fake repository for testing
///
/// Records all calls; claim statuses, child listings, download payloads and
/// update responses are scripted per test.
#[derive(Clone, Default)]
pub struct FakeRepo {
    inner: Arc<Mutex<FakeRepoState>>,
}

#[derive(Default)]
struct FakeRepoState {
    calls: Vec<RepoCall>,
    claim_status: HashMap<NodeRef, TaskStatus>,
    claim_error: Option<RepoError>,
    update_response: Option<TaskStatus>,
    updates: Vec<UpdateRecord>,
    children: HashMap<String, Vec<ChildEntry>>,
    downloads: HashMap<NodeRef, Vec<u8>>,
    uploads: Vec<UploadRecord>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RepoCall> {
        self.inner.lock().calls.clone()
    }

    pub fn claim_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RepoCall::Claim { .. }))
            .count()
    }

    /// Script the status a claim on `node` returns (default RUNNING).
    pub fn set_claim_status(&self, node: &NodeRef, status: TaskStatus) {
        self.inner.lock().claim_status.insert(node.clone(), status);
    }

    /// Error to return on the next claim.
    pub fn set_claim_error(&self, error: RepoError) {
        self.inner.lock().claim_error = Some(error);
    }

    /// Script the status the repository answers on every update; without it
    /// updates echo the status they were sent.
    pub fn set_update_response(&self, status: TaskStatus) {
        self.inner.lock().update_response = Some(status);
    }

    /// Script the children returned for a node type.
    pub fn set_children(&self, node_type: &str, entries: Vec<ChildEntry>) {
        self.inner
            .lock()
            .children
            .insert(node_type.to_string(), entries);
    }

    /// Script the bytes a download of `node` writes.
    pub fn set_download(&self, node: &NodeRef, bytes: Vec<u8>) {
        self.inner.lock().downloads.insert(node.clone(), bytes);
    }

    pub fn updates(&self) -> Vec<UpdateRecord> {
        self.inner.lock().updates.clone()
    }

    pub fn last_update(&self) -> Option<UpdateRecord> {
        self.inner.lock().updates.last().cloned()
    }

    /// Updates carrying a terminal status.
    pub fn terminal_updates(&self) -> Vec<UpdateRecord> {
        self.inner
            .lock()
            .updates
            .iter()
            .filter(|u| u.status.is_terminal())
            .cloned()
            .collect()
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.inner.lock().uploads.clone()
    }
}

#[async_trait]
impl RepoAdapter for FakeRepo {
    async fn claim(&self, stage: Stage, node: &NodeRef) -> Result<TaskInfo, RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::Claim {
            stage,
            node: node.clone(),
        });
        if let Some(error) = inner.claim_error.take() {
            return Err(error);
        }
        let status = inner
            .claim_status
            .get(node)
            .copied()
            .unwrap_or(TaskStatus::Running);
        Ok(TaskInfo {
            node: node.clone(),
            status,
        })
    }

    async fn update(
        &self,
        stage: Stage,
        node: &NodeRef,
        status: TaskStatus,
        step: Option<&str>,
        stdout: &str,
        stderr: &str,
    ) -> Result<TaskInfo, RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::Update {
            stage,
            node: node.clone(),
        });
        inner.updates.push(UpdateRecord {
            stage,
            node: node.clone(),
            status,
            step: step.map(str::to_string),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        });
        let answered = inner.update_response.unwrap_or(status);
        Ok(TaskInfo {
            node: node.clone(),
            status: answered,
        })
    }

    async fn children(
        &self,
        node: &NodeRef,
        node_type: &str,
    ) -> Result<Vec<ChildEntry>, RepoError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::Children {
            node: node.clone(),
            node_type: node_type.to_string(),
        });
        Ok(inner.children.get(node_type).cloned().unwrap_or_default())
    }

    async fn download(&self, node: &NodeRef, dest: &Path) -> Result<(), RepoError> {
        let bytes = {
            let mut inner = self.inner.lock();
            inner.calls.push(RepoCall::Download {
                node: node.clone(),
                dest: dest.to_path_buf(),
            });
            inner.downloads.get(node).cloned()
        };
        let bytes =
            bytes.ok_or_else(|| RepoError::Download(format!("no scripted content for {node}")))?;
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }

    async fn upload(
        &self,
        node: &NodeRef,
        name: &str,
        source: &Path,
        relative_path: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<(), RepoError> {
        let size = tokio::fs::metadata(source).await.map(|m| m.len())?;
        let mut inner = self.inner.lock();
        inner.calls.push(RepoCall::Upload {
            node: node.clone(),
            name: name.to_string(),
        });
        inner.uploads.push(UploadRecord {
            node: node.clone(),
            name: name.to_string(),
            source: source.to_path_buf(),
            relative_path: relative_path.map(str::to_string),
            content_type: content_type.map(str::to_string),
            size,
        });
        Ok(())
    }
}
