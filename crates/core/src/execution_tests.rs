// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_record_is_running_with_empty_buffers() {
    let record = ExecutionRecord::new(Stage::Meshing);
    assert_eq!(record.stage, Stage::Meshing);
    assert_eq!(record.status, TaskStatus::Running);
    assert!(record.stdout.is_empty());
    assert!(record.stderr.is_empty());
    assert!(record.pgid.is_none());
    assert!(record.archive.is_none());
}

#[test]
fn absorb_output_accumulates_with_newlines() {
    let mut record = ExecutionRecord::new(Stage::Simulation);
    record.absorb_output("first out", "first err");
    record.absorb_output("second out", "");
    assert_eq!(record.stdout, "first out\nsecond out");
    assert_eq!(record.stderr, "first err");
}

#[test]
fn push_error_folds_into_stderr() {
    let mut record = ExecutionRecord::new(Stage::Postproc);
    record.push_error("boom");
    record.push_error("again");
    assert_eq!(record.stderr, "boom\nagain");
}

#[test]
fn spawn_failure_has_synthetic_code() {
    let failure = ExecFailure::spawn("preproc", "No such file or directory");
    assert_eq!(failure.code, Some(-127));
    assert!(failure.signal.is_none());
    assert!(failure.message.contains("preproc"));
    assert!(failure.stderr.contains("No such file or directory"));
}

#[test]
fn outcome_accessors_cover_both_arms() {
    let ok = ExecOutcome::Success {
        stdout: "out".into(),
        stderr: "err".into(),
    };
    assert!(ok.is_success());
    assert_eq!(ok.stdout(), "out");
    assert_eq!(ok.stderr(), "err");

    let failed = ExecOutcome::Failure(ExecFailure {
        code: Some(2),
        signal: None,
        stdout: "partial".into(),
        stderr: "bad".into(),
        message: "exited with code 2".into(),
    });
    assert!(!failed.is_success());
    assert_eq!(failed.stdout(), "partial");
    assert_eq!(failed.stderr(), "bad");
}
