// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::EngineError;

fn node(s: &str) -> NodeRef {
    NodeRef::new(format!("workspace://SpacesStore/{s}"))
}

#[test]
fn begin_inserts_a_running_record() {
    let registry = StudyRegistry::new();
    let handle = registry.begin(&node("a"), Stage::Meshing).unwrap();
    assert_eq!(handle.lock().stage, Stage::Meshing);
    assert!(registry.contains(&node("a")));
    assert_eq!(registry.len(), 1);
}

#[test]
fn second_begin_for_any_stage_is_rejected() {
    let registry = StudyRegistry::new();
    registry.begin(&node("a"), Stage::Meshing).unwrap();
    let err = registry.begin(&node("a"), Stage::Simulation).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyProcessing(_)));
}

#[test]
fn different_studies_run_concurrently() {
    let registry = StudyRegistry::new();
    registry.begin(&node("a"), Stage::Meshing).unwrap();
    registry.begin(&node("b"), Stage::Postproc).unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn finish_releases_the_entry() {
    let registry = StudyRegistry::new();
    registry.begin(&node("a"), Stage::Meshing).unwrap();
    registry.finish(&node("a"));
    assert!(registry.is_empty());
    // and the study can start again
    registry.begin(&node("a"), Stage::Simulation).unwrap();
}

#[test]
fn finish_on_absent_entry_is_a_noop() {
    let registry = StudyRegistry::new();
    registry.finish(&node("ghost"));
    assert!(registry.is_empty());
}

#[test]
fn get_shares_the_live_record() {
    let registry = StudyRegistry::new();
    let handle = registry.begin(&node("a"), Stage::Simulation).unwrap();
    handle.lock().pgid = Some(4242);
    let seen = registry.get(&node("a")).unwrap();
    assert_eq!(seen.lock().pgid, Some(4242));
}
