// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn file_smaller_than_chunk_is_one_flagged_chunk() {
    let plan = chunk_plan(1024);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].offset, 0);
    assert_eq!(plan[0].len, 1024);
    assert!(plan[0].is_last);
}

#[test]
fn exact_multiple_emits_n_chunks_with_last_flagged() {
    // 16 MiB = exactly two chunks
    let plan = chunk_plan(2 * UPLOAD_CHUNK_SIZE);
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].len, UPLOAD_CHUNK_SIZE);
    assert!(!plan[0].is_last);
    assert_eq!(plan[1].offset, UPLOAD_CHUNK_SIZE);
    assert_eq!(plan[1].len, UPLOAD_CHUNK_SIZE);
    assert!(plan[1].is_last);
}

#[test]
fn trailing_partial_chunk() {
    let plan = chunk_plan(UPLOAD_CHUNK_SIZE + 7);
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[1].len, 7);
    assert!(plan[1].is_last);
}

#[test]
fn empty_file_still_terminates() {
    let plan = chunk_plan(0);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].len, 0);
    assert!(plan[0].is_last);
}

#[test]
fn offsets_cover_the_file_without_gaps() {
    let total = 3 * UPLOAD_CHUNK_SIZE + 99;
    let plan = chunk_plan(total);
    let mut expected = 0;
    for chunk in &plan {
        assert_eq!(chunk.offset, expected);
        expected += chunk.len;
    }
    assert_eq!(expected, total);
    assert!(plan.last().unwrap().is_last);
}
