// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal STOMP 1.2 consumer for the command queue
//!
//! Wire format: `COMMAND\nheader:value\n...\n\nbody\0`, frames separated by
//! optional heartbeat newlines. Only the consumer half is implemented; the
//! worker never publishes.

use super::{BusConsumer, BusError};
use aero_core::ActiveMqConfig;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// A parsed STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse one frame from the bytes read up to (not including) the NUL.
pub(crate) fn parse_frame(bytes: &[u8]) -> Result<Frame, BusError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| BusError::Protocol("frame is not utf-8".to_string()))?;
    // Leading newlines are heartbeats between frames
    let text = text.trim_start_matches('\n');

    let (head, body) = match text.split_once("\n\n") {
        Some(parts) => parts,
        None => (text, ""),
    };
    let mut lines = head.lines();
    let command = lines
        .next()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| BusError::Protocol("empty frame".to_string()))?
        .to_string();
    let mut headers = Vec::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| BusError::Protocol(format!("malformed header: {line}")))?;
        headers.push((name.to_string(), value.to_string()));
    }
    Ok(Frame {
        command,
        headers,
        body: body.to_string(),
    })
}

/// Encode a frame for sending.
pub(crate) fn encode_frame(command: &str, headers: &[(&str, &str)], body: &str) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(command);
    out.push('\n');
    for (name, value) in headers {
        out.push_str(name);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(body);
    let mut bytes = out.into_bytes();
    bytes.push(0);
    bytes
}

/// STOMP consumer subscribed to one queue.
pub struct StompConsumer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl StompConsumer {
    /// Connect, authenticate and subscribe.
    pub async fn connect(config: &ActiveMqConfig, queue: &str) -> Result<Self, BusError> {
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        let (read_half, write_half) = stream.into_split();
        let mut consumer = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        };

        consumer
            .send(
                "CONNECT",
                &[
                    ("accept-version", "1.2"),
                    ("host", config.host.as_str()),
                    ("login", config.username.as_str()),
                    ("passcode", config.password.as_str()),
                    ("heart-beat", "0,0"),
                ],
            )
            .await?;

        let connected = consumer
            .read_frame()
            .await?
            .ok_or(BusError::ConnectionClosed)?;
        if connected.command != "CONNECTED" {
            return Err(BusError::Protocol(format!(
                "expected CONNECTED, got {}",
                connected.command
            )));
        }

        consumer
            .send(
                "SUBSCRIBE",
                &[("id", "0"), ("destination", queue), ("ack", "auto")],
            )
            .await?;

        tracing::info!(host = %config.host, port = config.port, queue, "subscribed");
        Ok(consumer)
    }

    async fn send(&mut self, command: &str, headers: &[(&str, &str)]) -> Result<(), BusError> {
        let bytes = encode_frame(command, headers, "");
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>, BusError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = self.reader.read_until(0, &mut buf).await?;
            if read == 0 {
                return Ok(None);
            }
            if buf.last() == Some(&0) {
                buf.pop();
            }
            // A buffer of bare newlines is heartbeat traffic
            if buf.iter().all(|b| *b == b'\n') {
                continue;
            }
            return parse_frame(&buf).map(Some);
        }
    }
}

#[async_trait]
impl BusConsumer for StompConsumer {
    async fn next(&mut self) -> Result<Option<String>, BusError> {
        loop {
            let Some(frame) = self.read_frame().await? else {
                return Ok(None);
            };
            match frame.command.as_str() {
                "MESSAGE" => return Ok(Some(frame.body)),
                "ERROR" => {
                    let message = frame
                        .header("message")
                        .map(str::to_string)
                        .unwrap_or_else(|| frame.body.clone());
                    return Err(BusError::Protocol(message));
                }
                other => {
                    tracing::debug!(command = other, "ignoring frame");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "stomp_tests.rs"]
mod tests;
