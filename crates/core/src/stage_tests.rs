// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn archive_suffixes() {
    assert_eq!(Stage::Meshing.archive_suffix(), "meshing");
    assert_eq!(Stage::Simulation.archive_suffix(), "simulation");
    assert_eq!(Stage::Postproc.archive_suffix(), "postproc");
}

#[test]
fn display_matches_suffix() {
    for stage in [Stage::Meshing, Stage::Simulation, Stage::Postproc] {
        assert_eq!(stage.to_string(), stage.archive_suffix());
    }
}

#[test]
fn serde_roundtrip_lowercase() {
    let json = serde_json::to_string(&Stage::Postproc).unwrap();
    assert_eq!(json, "\"postproc\"");
    let back: Stage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Stage::Postproc);
}
