// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn terminal_statuses() {
    assert!(TaskStatus::Done.is_terminal());
    assert!(TaskStatus::Failed.is_terminal());
    assert!(!TaskStatus::Todo.is_terminal());
    assert!(!TaskStatus::Pending.is_terminal());
    assert!(!TaskStatus::Running.is_terminal());
}

#[test]
fn serde_is_uppercase() {
    assert_eq!(
        serde_json::to_string(&TaskStatus::Running).unwrap(),
        "\"RUNNING\""
    );
    let status: TaskStatus = serde_json::from_str("\"FAILED\"").unwrap();
    assert_eq!(status, TaskStatus::Failed);
}

#[test]
fn display_is_uppercase() {
    assert_eq!(TaskStatus::Done.to_string(), "DONE");
    assert_eq!(TaskStatus::Pending.to_string(), "PENDING");
}
