// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for pipeline tests: stub toolkit + fake repository

use crate::stage::StudyEngine;
use aero_adapters::repo::ChildEntry;
use aero_adapters::{FakeRepo, ProgramTable, Supervisor};
use aero_core::NodeRef;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// A study engine wired to stub external programs and a fake repository.
///
/// Every toolkit program is a shell script that drops a `ran-<name>` marker
/// into the workspace; tests overwrite script bodies to simulate failures.
/// The `7z` stub only `touch`es the archive on `a`.
pub struct Harness {
    _dir: tempfile::TempDir,
    pub studies: PathBuf,
    toolkit: PathBuf,
    pub repo: FakeRepo,
    pub engine: StudyEngine<FakeRepo>,
}

const PROGRAMS: &[(&str, &str, &str)] = &[
    ("preproc", "preproc/run.sh", "echo meshing ok\ntouch ran-preproc\n"),
    (
        "simulation",
        "solver/run.sh",
        "echo simulation ok\ntouch ran-simulation\n",
    ),
    // emiCalc runs in its scriptDir; the marker goes through -p_input ($2)
    ("emiCalc", "emi/run.sh", "touch \"$2/ran-emiCalc\"\n"),
    ("meanAndConcat", "mean/run.sh", "touch ran-meanAndConcat\n"),
    ("probesMeanYear", "probes/run.sh", "touch ran-probesMeanYear\n"),
    ("polluant", "polluant/run.sh", "touch ran-polluant\n"),
];

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let studies = dir.path().join("studies");
        let toolkit = dir.path().join("toolkit");
        std::fs::create_dir_all(&studies).unwrap();

        let mut programs = HashMap::new();
        for &(name, relpath, body) in PROGRAMS {
            write_script(&toolkit.join(relpath), body);
            programs.insert(name.to_string(), relpath.to_string());
        }
        write_script(
            &toolkit.join("7z.sh"),
            "if [ \"$1\" = \"a\" ]; then touch \"$3\"; fi\n",
        );
        programs.insert("7z".to_string(), "7z.sh".to_string());

        // Config files the argument builders check for next to the scripts
        std::fs::write(toolkit.join("preproc/computationDict"), "mesh 20\n").unwrap();
        std::fs::write(toolkit.join("probes/config"), "probes\n").unwrap();
        std::fs::write(toolkit.join("polluant/Logo_airetd.png"), "png\n").unwrap();

        let table = ProgramTable::new(&toolkit, "python3", programs, &studies);
        let repo = FakeRepo::new();
        let engine = StudyEngine::new(repo.clone(), Supervisor::new(table), &studies);

        Self {
            _dir: dir,
            studies,
            toolkit,
            repo,
            engine,
        }
    }

    /// Replace a stub program's body for one test.
    pub fn set_program(&self, name: &str, body: &str) {
        let relpath = PROGRAMS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, p, _)| *p)
            .unwrap();
        write_script(&self.toolkit.join(relpath), body);
    }

    /// Zip bytes for scripted downloads.
    pub fn make_zip(&self, entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    /// Script a folder child plus its downloadable archive.
    pub fn seed_folder(&self, node_type: &str, folder: &NodeRef, zip: Vec<u8>) {
        self.repo.set_children(
            node_type,
            vec![ChildEntry {
                node: folder.clone(),
                name: node_type.to_string(),
            }],
        );
        self.repo.set_download(folder, zip);
    }

    pub fn workspace(&self, study: &NodeRef) -> PathBuf {
        self.studies.join(study.uuid())
    }
}

fn write_script(path: &std::path::Path, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// Poll until `check` holds or the timeout elapses.
pub async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !check() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached within timeout");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub fn study_ref() -> NodeRef {
    NodeRef::new("workspace://SpacesStore/e72baac6-4ea8-4366-bddc-f8841f06a9b0")
}
