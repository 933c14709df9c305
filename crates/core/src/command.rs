// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus command messages

use crate::id::NodeRef;
use serde::Deserialize;

/// A recognised worker command, parsed from a bus frame.
///
/// Frames are JSON of the shape `{"cmd": ..., "nodeRef": ..., "simNodeRef"?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartMeshing { node: NodeRef },
    AbortMeshing { node: NodeRef },
    StartSimulation { node: NodeRef, sim: NodeRef },
    AbortSimulation { node: NodeRef, sim: NodeRef },
    StartPostproc { node: NodeRef },
    AbortPostproc { node: NodeRef },
}

#[derive(Deserialize)]
struct RawMessage {
    cmd: String,
    #[serde(rename = "nodeRef")]
    node_ref: Option<String>,
    #[serde(rename = "simNodeRef")]
    sim_node_ref: Option<String>,
}

/// Why a frame produced no command.
#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    #[error("malformed command frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("command {cmd} is missing field {field}")]
    MissingField { cmd: String, field: &'static str },
}

impl Command {
    /// Parse a bus frame. `Ok(None)` means a well-formed frame carrying a
    /// command this worker does not recognise (ignored by contract).
    pub fn parse(frame: &str) -> Result<Option<Command>, CommandParseError> {
        let raw: RawMessage = serde_json::from_str(frame)?;

        let node = |raw: &RawMessage| -> Result<NodeRef, CommandParseError> {
            raw.node_ref
                .clone()
                .map(NodeRef::new)
                .ok_or(CommandParseError::MissingField {
                    cmd: raw.cmd.clone(),
                    field: "nodeRef",
                })
        };
        let sim = |raw: &RawMessage| -> Result<NodeRef, CommandParseError> {
            raw.sim_node_ref
                .clone()
                .map(NodeRef::new)
                .ok_or(CommandParseError::MissingField {
                    cmd: raw.cmd.clone(),
                    field: "simNodeRef",
                })
        };

        let command = match raw.cmd.as_str() {
            "start-meshing" => Command::StartMeshing { node: node(&raw)? },
            "abort-meshing" => Command::AbortMeshing { node: node(&raw)? },
            "start-simulation" => Command::StartSimulation {
                node: node(&raw)?,
                sim: sim(&raw)?,
            },
            "abort-simulation" => Command::AbortSimulation {
                node: node(&raw)?,
                sim: sim(&raw)?,
            },
            "start-postproc" => Command::StartPostproc { node: node(&raw)? },
            "abort-postproc" => Command::AbortPostproc { node: node(&raw)? },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Whether this is a `start-*` command (subject to the pre-start delay).
    pub fn is_start(&self) -> bool {
        matches!(
            self,
            Command::StartMeshing { .. }
                | Command::StartSimulation { .. }
                | Command::StartPostproc { .. }
        )
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
