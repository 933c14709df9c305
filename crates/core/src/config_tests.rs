// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

const SAMPLE: &str = r#"
root_dir = "/var/lib/aero"

[alfresco]
url = "http://repo.example:8080/alfresco"
username = "worker"
password = "secret"

[activemq]
host = "mq.example"
port = 61613

[toolkit]
path = "/opt/toolkit"

[toolkit.programs]
preproc = "preproc/run.sh"
simulation = "solver/simulation.py"

[logger]
level = "debug"
"#;

fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("worker.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    path
}

fn clear_worker_env() {
    for var in ["WORKER_ROOT_DIR", "WORKER_STUDIES_DIR", "WORKER_BIN_DIR"] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn parses_sample_and_resolves_relative_dirs() {
    clear_worker_env();
    let dir = tempfile::tempdir().unwrap();
    let config = WorkerConfig::from_path(&write_sample(&dir)).unwrap();

    assert_eq!(config.root_dir, PathBuf::from("/var/lib/aero"));
    assert_eq!(config.studies_dir, PathBuf::from("/var/lib/aero/studies"));
    assert_eq!(config.bin_dir, PathBuf::from("/var/lib/aero/bin"));
    assert_eq!(config.alfresco.username, "worker");
    assert_eq!(config.activemq.port, 61613);
    assert_eq!(
        config.toolkit.programs.get("simulation").map(String::as_str),
        Some("solver/simulation.py")
    );
    assert_eq!(config.logger.level, "debug");
}

#[test]
#[serial]
fn env_overrides_win() {
    clear_worker_env();
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("WORKER_ROOT_DIR", "/srv/aero");
    std::env::set_var("WORKER_STUDIES_DIR", "/scratch/studies");
    let config = WorkerConfig::from_path(&write_sample(&dir)).unwrap();
    clear_worker_env();

    assert_eq!(config.root_dir, PathBuf::from("/srv/aero"));
    assert_eq!(config.studies_dir, PathBuf::from("/scratch/studies"));
    // bin_dir stays relative to the overridden root
    assert_eq!(config.bin_dir, PathBuf::from("/srv/aero/bin"));
}

#[test]
#[serial]
fn missing_file_is_a_read_error() {
    clear_worker_env();
    let err = WorkerConfig::from_path(Path::new("/nonexistent/worker.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
#[serial]
fn archive_paths_sit_next_to_workspace() {
    clear_worker_env();
    let dir = tempfile::tempdir().unwrap();
    let config = WorkerConfig::from_path(&write_sample(&dir)).unwrap();
    let id = StudyId::new("e72baac6");

    assert_eq!(
        config.study_workspace(&id),
        PathBuf::from("/var/lib/aero/studies/e72baac6")
    );
    assert_eq!(
        config.input_zip(&id),
        PathBuf::from("/var/lib/aero/studies/e72baac6.zip")
    );
    assert_eq!(
        config.stage_archive(&id, Stage::Meshing),
        PathBuf::from("/var/lib/aero/studies/e72baac6-meshing.7z")
    );
    assert_eq!(
        config.postproc_inputs_zip(&id),
        PathBuf::from("/var/lib/aero/studies/e72baac6-postprocInputs.zip")
    );
}
