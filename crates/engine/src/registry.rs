// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide registry of actively executing studies

use crate::error::EngineError;
use aero_core::{ExecutionRecord, NodeRef, Stage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to one study's live execution state.
pub type ExecutionHandle = Arc<Mutex<ExecutionRecord>>;

/// Maps study references to their running execution.
///
/// A reference is present iff a stage for that study is currently executing
/// in this process; at most one stage per study. Entries are removed on the
/// pipeline's finalisation path, success or failure alike.
#[derive(Clone, Default)]
pub struct StudyRegistry {
    inner: Arc<Mutex<HashMap<NodeRef, ExecutionHandle>>>,
}

impl StudyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh execution record, failing if the study already has one.
    pub fn begin(&self, study: &NodeRef, stage: Stage) -> Result<ExecutionHandle, EngineError> {
        let mut inner = self.inner.lock();
        if inner.contains_key(study) {
            return Err(EngineError::AlreadyProcessing(study.clone()));
        }
        let handle = Arc::new(Mutex::new(ExecutionRecord::new(stage)));
        inner.insert(study.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Remove a study's entry; no-op if absent (an abort may have raced the
    /// finaliser).
    pub fn finish(&self, study: &NodeRef) {
        self.inner.lock().remove(study);
    }

    /// Live handle for a study, if one is executing.
    pub fn get(&self, study: &NodeRef) -> Option<ExecutionHandle> {
        self.inner.lock().get(study).cloned()
    }

    pub fn contains(&self, study: &NodeRef) -> bool {
        self.inner.lock().contains_key(study)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
