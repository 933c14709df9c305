// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::EngineError;
use crate::test_support::{study_ref, wait_until, Harness};
use aero_core::{NodeRef, TaskStatus};

fn sim_ref() -> NodeRef {
    NodeRef::new("workspace://SpacesStore/0f3cd91e-sim-task")
}

#[tokio::test]
async fn happy_simulation_reports_done() {
    let h = Harness::new();
    let (study, sim) = (study_ref(), sim_ref());

    h.engine.run_simulation(&study, &sim).await.unwrap();

    assert!(h.workspace(&study).join("ran-simulation").exists());
    assert!(h
        .studies
        .join("e72baac6-4ea8-4366-bddc-f8841f06a9b0-simulation.7z")
        .exists());

    // claim and all updates target the simulation task node
    let terminal = h.repo.terminal_updates();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].node, sim);
    assert_eq!(terminal[0].status, TaskStatus::Done);
    assert_eq!(terminal[0].step.as_deref(), Some("compressing"));
    assert!(h.engine.registry().is_empty());
}

#[tokio::test]
async fn divergence_still_compresses_then_fails() {
    let h = Harness::new();
    let (study, sim) = (study_ref(), sim_ref());
    h.set_program(
        "simulation",
        "printf 'time 42\\n'\nprintf 'a divergé\\n' >&2\nexit 0\n",
    );

    // a diverged solver is not a pipeline error: the run itself completes
    h.engine.run_simulation(&study, &sim).await.unwrap();

    // the archive was still produced for inspection
    assert!(h
        .studies
        .join("e72baac6-4ea8-4366-bddc-f8841f06a9b0-simulation.7z")
        .exists());

    let terminal = h.repo.terminal_updates();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].status, TaskStatus::Failed);
    assert!(terminal[0].stderr.contains("a divergé"));
}

#[tokio::test]
async fn foam_fatal_error_is_fatal_too() {
    let h = Harness::new();
    let (study, sim) = (study_ref(), sim_ref());
    h.set_program("simulation", "echo 'FOAM FATAL ERROR: floating point'\n");

    h.engine.run_simulation(&study, &sim).await.unwrap();

    assert_eq!(
        h.repo.last_update().unwrap().status,
        TaskStatus::Failed
    );
}

#[tokio::test]
async fn abort_mid_simulation_kills_the_group() {
    let h = Harness::new();
    let (study, sim) = (study_ref(), sim_ref());
    h.set_program("simulation", "sleep 30\n");

    let engine = h.engine.clone();
    let (study_clone, sim_clone) = (study.clone(), sim.clone());
    let running =
        tokio::spawn(async move { engine.run_simulation(&study_clone, &sim_clone).await });

    // wait for the solver child to be live
    let registry = h.engine.registry().clone();
    let study_clone = study.clone();
    wait_until(move || {
        registry
            .get(&study_clone)
            .is_some_and(|record| record.lock().pgid.is_some())
    })
    .await;

    h.engine.abort_simulation(&study, &sim).await.unwrap();

    let err = running.await.unwrap().unwrap_err();
    match err {
        EngineError::Process(failure) => assert_eq!(failure.signal, Some(15)),
        other => panic!("expected process failure, got {other}"),
    }

    let terminal = h.repo.terminal_updates();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].status, TaskStatus::Failed);
    assert!(terminal[0].stderr.contains("killed by signal 15"));
    assert!(h.engine.registry().is_empty());
}

#[tokio::test]
async fn abort_for_the_wrong_stage_is_refused() {
    let h = Harness::new();
    let study = study_ref();
    let folder = NodeRef::new("workspace://SpacesStore/inputs-folder");
    h.seed_folder("cfd:inputs", &folder, h.make_zip(&[("a.txt", "x")]));
    h.set_program("preproc", "sleep 30\n");

    let engine = h.engine.clone();
    let study_clone = study.clone();
    let running = tokio::spawn(async move { engine.run_meshing(&study_clone).await });

    let registry = h.engine.registry().clone();
    let study_clone = study.clone();
    wait_until(move || {
        registry
            .get(&study_clone)
            .is_some_and(|record| record.lock().pgid.is_some())
    })
    .await;

    let err = h
        .engine
        .abort_simulation(&study, &sim_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WrongStep { .. }));

    // clean up the still-running meshing child
    h.engine.abort_meshing(&study).await.unwrap();
    let _ = running.await.unwrap();
}

#[tokio::test]
async fn abort_without_active_execution_reports_failed_directly() {
    let h = Harness::new();
    let (study, sim) = (study_ref(), sim_ref());

    h.engine.abort_simulation(&study, &sim).await.unwrap();

    assert_eq!(h.repo.claim_count(), 0);
    let updates = h.repo.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].node, sim);
    assert_eq!(updates[0].status, TaskStatus::Failed);
    assert_eq!(updates[0].stderr, "user aborted");
}
