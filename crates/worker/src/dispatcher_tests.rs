// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aero_adapters::{FakeBus, FakeRepo, ProgramTable, Supervisor};
use aero_core::{NodeRef, TaskStatus};
use std::collections::HashMap;

struct Harness {
    _dir: tempfile::TempDir,
    repo: FakeRepo,
    dispatcher: Dispatcher<FakeRepo>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let table = ProgramTable::new("/opt/toolkit", "python3", HashMap::new(), dir.path());
    let repo = FakeRepo::new();
    let engine = Arc::new(StudyEngine::new(
        repo.clone(),
        Supervisor::new(table),
        dir.path(),
    ));
    Harness {
        _dir: dir,
        repo,
        dispatcher: Dispatcher::new(engine),
    }
}

fn study() -> NodeRef {
    NodeRef::new("workspace://SpacesStore/e72baac6-4ea8-4366-bddc-f8841f06a9b0")
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn start_commands_honour_the_publish_delay() {
    let h = harness();
    // a PENDING claim stops the pipeline right after the claim call
    h.repo.set_claim_status(&study(), TaskStatus::Pending);

    h.dispatcher.handle_frame(
        r#"{"cmd":"start-meshing","nodeRef":"workspace://SpacesStore/e72baac6-4ea8-4366-bddc-f8841f06a9b0"}"#,
    );

    settle().await;
    assert_eq!(h.repo.claim_count(), 0, "claim before the 2s delay");

    tokio::time::advance(START_DELAY).await;
    settle().await;
    assert_eq!(h.repo.claim_count(), 1, "claim after the 2s delay");
}

#[tokio::test(start_paused = true)]
async fn abort_commands_act_immediately() {
    let h = harness();

    h.dispatcher.handle_frame(
        r#"{"cmd":"abort-postproc","nodeRef":"workspace://SpacesStore/e72baac6-4ea8-4366-bddc-f8841f06a9b0"}"#,
    );

    // no time advance: the update must already be out
    settle().await;
    let updates = h.repo.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, TaskStatus::Failed);
    assert_eq!(updates[0].stderr, "user aborted");
}

#[tokio::test(start_paused = true)]
async fn unknown_commands_are_ignored() {
    let h = harness();

    h.dispatcher
        .handle_frame(r#"{"cmd":"start-folding","nodeRef":"workspace://SpacesStore/x"}"#);

    tokio::time::advance(START_DELAY).await;
    settle().await;
    assert!(h.repo.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_are_discarded() {
    let h = harness();

    h.dispatcher.handle_frame("not json at all");
    h.dispatcher.handle_frame(r#"{"cmd":"abort-simulation","nodeRef":"workspace://SpacesStore/x"}"#);

    tokio::time::advance(START_DELAY).await;
    settle().await;
    // the second frame is missing simNodeRef, so both are dropped
    assert!(h.repo.calls().is_empty());
}

#[tokio::test]
async fn run_drains_the_bus_until_close() {
    let h = harness();
    let bus = FakeBus::with_frames([
        r#"{"cmd":"abort-meshing","nodeRef":"workspace://SpacesStore/e72baac6-4ea8-4366-bddc-f8841f06a9b0"}"#,
    ]);

    h.dispatcher.run(bus).await.unwrap();

    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    while h.repo.updates().is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "update never arrived");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(h.repo.updates()[0].stderr, "user aborted");
}
