// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: child processes, archives, repository, bus

pub mod archive;
pub mod args;
pub mod bus;
pub mod repo;
pub mod subprocess;
pub mod traced;

pub use archive::ArchiveError;
pub use args::{build_argv, ArgContext, ArgError, ArgSpec, PathKind};
pub use bus::{BusConsumer, BusError, StompConsumer};
pub use repo::{
    chunk_plan, AlfrescoRepo, ChildEntry, ChunkSpec, RepoAdapter, RepoError, TaskInfo,
    UPLOAD_CHUNK_SIZE,
};
pub use subprocess::{
    kill_group, ExecRequest, ProgramError, ProgramTable, SupervisedChild, Supervisor,
    SupervisorError,
};
pub use traced::TracedRepo;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use bus::FakeBus;
#[cfg(any(test, feature = "test-support"))]
pub use repo::{FakeRepo, RepoCall, UpdateRecord, UploadRecord};
