// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aero worker daemon (aerod)
//!
//! Consumes study commands from the message bus and drives the stage
//! pipelines. One process may execute stages for several studies at once;
//! per-study exclusivity is the engine's job.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod dispatcher;

use std::sync::Arc;

use aero_adapters::{AlfrescoRepo, ProgramTable, StompConsumer, Supervisor, TracedRepo};
use aero_core::WorkerConfig;
use aero_engine::StudyEngine;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::dispatcher::{Dispatcher, COMMAND_QUEUE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("aerod {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("aerod {}", env!("CARGO_PKG_VERSION"));
                println!("Aero CFD compute worker daemon");
                println!();
                println!("USAGE:");
                println!("    aerod");
                println!();
                println!("Configuration comes from WORKER_CONFIG_FILE (default worker.toml)");
                println!("with WORKER_ROOT_DIR / WORKER_STUDIES_DIR / WORKER_BIN_DIR overrides.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: aerod [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = WorkerConfig::load()?;
    setup_logging(&config);

    info!(
        studies_dir = %config.studies_dir.display(),
        repository = %config.alfresco.url,
        "starting worker"
    );
    std::fs::create_dir_all(&config.studies_dir)?;

    let repo = TracedRepo::new(AlfrescoRepo::new(&config.alfresco));
    let supervisor = Supervisor::new(ProgramTable::from_config(&config));
    let engine = Arc::new(StudyEngine::new(repo, supervisor, &config.studies_dir));
    let dispatcher = Dispatcher::new(engine);

    let bus = StompConsumer::connect(&config.activemq, COMMAND_QUEUE).await?;
    info!(queue = COMMAND_QUEUE, "worker ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        result = dispatcher.run(bus) => {
            match result {
                Ok(()) => info!("bus closed, shutting down"),
                Err(e) => {
                    error!(error = %e, "bus failure, shutting down");
                    return Err(e.into());
                }
            }
        }
        _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        _ = sigint.recv() => info!("SIGINT received, shutting down"),
    }

    Ok(())
}

/// Level comes from the config file; `RUST_LOG` wins when set.
fn setup_logging(config: &WorkerConfig) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logger.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
