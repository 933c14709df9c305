// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_start_meshing() {
    let frame = r#"{"cmd":"start-meshing","nodeRef":"workspace://SpacesStore/e72baac6-4ea8-4366-bddc-f8841f06a9b0"}"#;
    let cmd = Command::parse(frame).unwrap().unwrap();
    assert_eq!(
        cmd,
        Command::StartMeshing {
            node: NodeRef::new("workspace://SpacesStore/e72baac6-4ea8-4366-bddc-f8841f06a9b0"),
        }
    );
    assert!(cmd.is_start());
}

#[test]
fn parses_simulation_pair() {
    let frame = r#"{"cmd":"start-simulation","nodeRef":"workspace://SpacesStore/a","simNodeRef":"workspace://SpacesStore/b"}"#;
    let cmd = Command::parse(frame).unwrap().unwrap();
    assert_eq!(
        cmd,
        Command::StartSimulation {
            node: NodeRef::new("workspace://SpacesStore/a"),
            sim: NodeRef::new("workspace://SpacesStore/b"),
        }
    );
}

#[test]
fn abort_commands_are_not_start() {
    let frame = r#"{"cmd":"abort-postproc","nodeRef":"workspace://SpacesStore/a"}"#;
    let cmd = Command::parse(frame).unwrap().unwrap();
    assert!(!cmd.is_start());
}

#[test]
fn unknown_command_is_ignored() {
    let frame = r#"{"cmd":"start-folding","nodeRef":"workspace://SpacesStore/a"}"#;
    assert!(Command::parse(frame).unwrap().is_none());
}

#[test]
fn garbage_is_malformed() {
    assert!(matches!(
        Command::parse("not json"),
        Err(CommandParseError::Malformed(_))
    ));
}

#[test]
fn missing_sim_ref_is_an_error() {
    let frame = r#"{"cmd":"abort-simulation","nodeRef":"workspace://SpacesStore/a"}"#;
    assert!(matches!(
        Command::parse(frame),
        Err(CommandParseError::MissingField {
            field: "simNodeRef",
            ..
        })
    ));
}
