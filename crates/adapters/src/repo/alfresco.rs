// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client against the Alfresco-backed content repository

use super::chunk::chunk_plan;
use super::{ChildEntry, RepoAdapter, RepoError, TaskInfo};
use aero_core::{AlfrescoConfig, NodeRef, Stage, TaskStatus};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Poll cadence for download sessions.
const DOWNLOAD_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Give up on a download session after this many polls.
const DOWNLOAD_POLL_LIMIT: u32 = 1200;

#[derive(Deserialize)]
struct DownloadSession {
    #[serde(rename = "downloadId")]
    download_id: String,
}

#[derive(Deserialize)]
struct DownloadStatus {
    status: String,
}

#[derive(Deserialize)]
struct CreatedNode {
    #[serde(rename = "nodeRef")]
    node: NodeRef,
}

/// Repository client over the worker webscripts.
#[derive(Clone)]
pub struct AlfrescoRepo {
    client: reqwest::Client,
    base: String,
    username: String,
    password: String,
}

impl AlfrescoRepo {
    pub fn new(config: &AlfrescoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/service/aero/{}", self.base, path)
    }

    /// Send with credentials, mapping transport and HTTP failures to the
    /// repository error taxonomy.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, RepoError> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|_| RepoError::NoAnswer)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status.as_u16() {
            400 => {
                let body = response.text().await.unwrap_or_default();
                Err(RepoError::InvalidParameter(body))
            }
            401 => Err(RepoError::AuthenticationFailed),
            403 => Err(RepoError::PermissionDenied),
            code => Err(RepoError::Unexpected { code }),
        }
    }

    async fn json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RepoError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RepoError::Payload(e.to_string()))
    }
}

#[async_trait]
impl RepoAdapter for AlfrescoRepo {
    async fn claim(&self, stage: Stage, node: &NodeRef) -> Result<TaskInfo, RepoError> {
        let url = self.url(&format!("{}/claim", stage.task_path()));
        let request = self.client.post(url).query(&[("nodeRef", node.as_str())]);
        self.json(request).await
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
        let url = self.url(&format!("{}/update", stage.task_path()));
        let body = serde_json::json!({
            "nodeRef": node.as_str(),
            "status": status,
            "stage": step,
            "stdout": stdout,
            "stderr": stderr,
        });
        let request = self.client.post(url).json(&body);
        self.json(request).await
    }

    async fn children(
        &self,
        node: &NodeRef,
        node_type: &str,
    ) -> Result<Vec<ChildEntry>, RepoError> {
        let url = self.url("children");
        let request = self
            .client
            .get(url)
            .query(&[("nodeRef", node.as_str()), ("type", node_type)]);
        self.json(request).await
    }

    async fn download(&self, node: &NodeRef, dest: &Path) -> Result<(), RepoError> {
        // 1. Open a download session
        let session: DownloadSession = self
            .json(
                self.client
                    .post(self.url("download"))
                    .query(&[("nodeRef", node.as_str())]),
            )
            .await?;

        // 2. Poll until the repository finishes packaging
        let mut polls = 0;
        loop {
            let status: DownloadStatus = self
                .json(
                    self.client
                        .get(self.url(&format!("download/{}", session.download_id))),
                )
                .await?;
            match status.status.as_str() {
                "DONE" => break,
                "FAILED" | "CANCELLED" => {
                    return Err(RepoError::Download(format!(
                        "download session {} ended as {}",
                        session.download_id, status.status
                    )));
                }
                _ => {
                    polls += 1;
                    if polls >= DOWNLOAD_POLL_LIMIT {
                        return Err(RepoError::Download(format!(
                            "download session {} still pending after {} polls",
                            session.download_id, polls
                        )));
                    }
                    tokio::time::sleep(DOWNLOAD_POLL_INTERVAL).await;
                }
            }
        }

        // 3. Stream the content to disk
        let response = self
            .send(
                self.client
                    .get(self.url(&format!("download/{}/content", session.download_id))),
            )
            .await?;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(bytes) = stream.next().await {
            let bytes = bytes.map_err(|e| RepoError::Download(e.to_string()))?;
            file.write_all(&bytes).await?;
        }
        file.flush().await?;

        tracing::info!(node = %node, dest = %dest.display(), "downloaded");
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
        // 1. Create the empty content node
        let mut query = vec![("nodeRef", node.as_str()), ("name", name)];
        if let Some(relative) = relative_path {
            query.push(("relativePath", relative));
        }
        if let Some(node_type) = content_type {
            query.push(("type", node_type));
        }
        let created: CreatedNode = self
            .json(self.client.post(self.url("upload")).query(&query))
            .await?;

        // 2. Append fixed-size chunks, the last one flagged
        let total = tokio::fs::metadata(source).await?.len();
        let mut file = tokio::fs::File::open(source).await?;
        for chunk in chunk_plan(total) {
            let mut buf = vec![0u8; chunk.len as usize];
            file.read_exact(&mut buf).await?;
            let url = self.url(&format!("upload/{}/chunk", created.node.uuid()));
            self.send(
                self.client
                    .put(url)
                    .query(&[("isLastChunk", if chunk.is_last { "true" } else { "false" })])
                    .body(buf),
            )
            .await?;
        }

        tracing::info!(node = %node, name, bytes = total, "uploaded");
        Ok(())
    }
}
