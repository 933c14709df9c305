// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::repo::{ChildEntry, RepoAdapter, RepoError, TaskInfo};
use aero_core::{NodeRef, Stage, TaskStatus};
use async_trait::async_trait;
use std::path::Path;
use tracing::Instrument;

/// Wrapper that adds tracing to any RepoAdapter
#[derive(Clone)]
pub struct TracedRepo<R> {
    inner: R,
}

impl<R> TracedRepo<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: RepoAdapter> RepoAdapter for TracedRepo<R> {
    async fn claim(&self, stage: Stage, node: &NodeRef) -> Result<TaskInfo, RepoError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.claim(stage, node).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(info) => tracing::info!(status = %info.status, elapsed_ms, "claimed"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "claim failed"),
            }
            result
        }
        .instrument(tracing::info_span!("repo.claim", %stage, node = %node))
        .await
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
        async {
            let result = self
                .inner
                .update(stage, node, status, step, stdout, stderr)
                .await;
            match &result {
                Ok(info) => tracing::debug!(answered = %info.status, "updated"),
                Err(e) => tracing::error!(error = %e, "update failed"),
            }
            result
        }
        .instrument(tracing::info_span!("repo.update", %stage, node = %node, sent = %status, step))
        .await
    }

    async fn children(
        &self,
        node: &NodeRef,
        node_type: &str,
    ) -> Result<Vec<ChildEntry>, RepoError> {
        let result = self.inner.children(node, node_type).await;
        match &result {
            Ok(entries) => {
                tracing::debug!(node = %node, node_type, count = entries.len(), "children")
            }
            Err(e) => tracing::error!(node = %node, node_type, error = %e, "children failed"),
        }
        result
    }

    async fn download(&self, node: &NodeRef, dest: &Path) -> Result<(), RepoError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.download(node, dest).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "download complete"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "download failed"),
            }
            result
        }
        .instrument(tracing::info_span!("repo.download", node = %node, dest = %dest.display()))
        .await
    }

    async fn upload(
        &self,
        node: &NodeRef,
        name: &str,
        source: &Path,
        relative_path: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<(), RepoError> {
        async {
            let start = std::time::Instant::now();
            let result = self
                .inner
                .upload(node, name, source, relative_path, content_type)
                .await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "upload complete"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "upload failed"),
            }
            result
        }
        .instrument(tracing::info_span!("repo.upload", node = %node, name))
        .await
    }
}
