// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! aero - manual worker utilities
//!
//! The same archive and upload plumbing the daemon uses, driven by hand:
//! useful for re-packaging a study after a crashed stage or pushing results
//! the worker could not deliver.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use aero_adapters::{archive, AlfrescoRepo, ProgramTable, RepoAdapter, Supervisor};
use aero_core::{NodeRef, Stage, StudyId, WorkerConfig};

#[derive(Parser)]
#[command(name = "aero", version, about = "Aero CFD worker utilities")]
struct Cli {
    /// Config file (default: WORKER_CONFIG_FILE, then worker.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a study workspace into a stage archive
    Compress {
        study_id: String,
        #[arg(value_enum)]
        stage: StageArg,
    },
    /// Unpack a stage archive into a study workspace
    Uncompress {
        archive: PathBuf,
        study_id: String,
    },
    /// Upload a file under a repository node
    Upload {
        node_ref: String,
        file: PathBuf,
        /// Name of the created content node (default: the file name)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        relative_path: Option<String>,
        /// Repository content type of the created node
        #[arg(long = "type")]
        content_type: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    Meshing,
    Simulation,
    Postproc,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Meshing => Stage::Meshing,
            StageArg::Simulation => Stage::Simulation,
            StageArg::Postproc => Stage::Postproc,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WorkerConfig::from_path(path)?,
        None => WorkerConfig::load()?,
    };

    match cli.command {
        Commands::Compress { study_id, stage } => {
            let id = StudyId::new(study_id);
            let workspace = config.study_workspace(&id);
            if !workspace.is_dir() {
                bail!("workspace {} does not exist", workspace.display());
            }
            let supervisor = Supervisor::new(ProgramTable::from_config(&config));
            let produced = archive::compress_stage(
                &supervisor,
                &config.studies_dir,
                &id,
                stage.into(),
                &workspace,
                None,
            )
            .await?;
            println!("{}", produced.display());
        }
        Commands::Uncompress { archive, study_id } => {
            let id = StudyId::new(study_id);
            let workspace = config.study_workspace(&id);
            std::fs::create_dir_all(&workspace)
                .with_context(|| format!("creating {}", workspace.display()))?;
            let supervisor = Supervisor::new(ProgramTable::from_config(&config));
            archive::uncompress(&supervisor, &archive, &workspace).await?;
            println!("{}", workspace.display());
        }
        Commands::Upload {
            node_ref,
            file,
            name,
            relative_path,
            content_type,
        } => {
            let node = NodeRef::new(node_ref);
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("file has no name to upload under")?,
            };
            let repo = AlfrescoRepo::new(&config.alfresco);
            repo.upload(
                &node,
                &name,
                &file,
                relative_path.as_deref(),
                content_type.as_deref(),
            )
            .await?;
            println!("uploaded {} as {}", file.display(), name);
        }
    }

    Ok(())
}
