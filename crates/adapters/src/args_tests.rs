// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn ctx(study: &Path, script: &Path) -> ArgContext {
    ArgContext {
        study_dir: study.to_path_buf(),
        script_dir: script.to_path_buf(),
    }
}

#[test]
fn expands_descriptors_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let specs = vec![
        ArgSpec::opt("-np_mesh"),
        ArgSpec::val("20"),
        ArgSpec::opt_val("-snappy_enable", "false"),
    ];
    let argv = build_argv(&specs, &ctx(dir.path(), dir.path())).unwrap();
    assert_eq!(argv, vec!["-np_mesh", "20", "-snappy_enable", "false"]);
}

#[test]
fn interpolates_study_and_script_dirs() {
    let study = tempfile::tempdir().unwrap();
    let script = tempfile::tempdir().unwrap();
    std::fs::write(script.path().join("computationDict"), "x").unwrap();

    let specs = vec![
        ArgSpec::opt_val("-p_working", "{studyDir}").dir(),
        ArgSpec::opt_val("-p_config", "{scriptDir}/computationDict").file(),
    ];
    let argv = build_argv(&specs, &ctx(study.path(), script.path())).unwrap();
    assert_eq!(argv[1], study.path().to_string_lossy());
    assert_eq!(
        argv[3],
        script.path().join("computationDict").to_string_lossy()
    );
}

#[test]
fn missing_file_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let specs = vec![ArgSpec::opt_val("-p_freq", "{studyDir}/frequencesVent").file()];
    let err = build_argv(&specs, &ctx(dir.path(), dir.path())).unwrap_err();
    assert!(matches!(err, ArgError::NotFound(_)));
    assert!(err.to_string().contains("frequencesVent not found"));
}

#[test]
fn missing_dir_fails_without_create() {
    let dir = tempfile::tempdir().unwrap();
    let specs = vec![ArgSpec::opt_val("-p_output", "{studyDir}/emiCalc").dir()];
    let err = build_argv(&specs, &ctx(dir.path(), dir.path())).unwrap_err();
    assert!(matches!(err, ArgError::NotFound(_)));
}

#[test]
fn create_if_missing_creates_directory_chain() {
    let dir = tempfile::tempdir().unwrap();
    let specs = vec![ArgSpec::opt_val("-p_output", "{studyDir}/deep/emiCalc")
        .dir()
        .or_create()];
    build_argv(&specs, &ctx(dir.path(), dir.path())).unwrap();

    let created = dir.path().join("deep/emiCalc");
    assert!(created.is_dir());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&created).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[test]
fn file_where_directory_expected_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("taken"), "x").unwrap();
    let specs = vec![ArgSpec::opt_val("-p_working", "{studyDir}/taken").dir()];
    let err = build_argv(&specs, &ctx(dir.path(), dir.path())).unwrap_err();
    assert!(matches!(err, ArgError::NotADirectory(_)));
}

#[test]
fn untyped_values_skip_checks() {
    let dir = tempfile::tempdir().unwrap();
    let specs = vec![ArgSpec::opt_val("-e", "{studyDir}/nonexistent")];
    assert!(build_argv(&specs, &ctx(dir.path(), dir.path())).is_ok());
}
