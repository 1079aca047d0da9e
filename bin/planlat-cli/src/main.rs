// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # planlat
//!
//! Command-line interface for the planlat latency predictor.
//!
//! ## Usage
//! ```bash
//! # Train (or load) a predictor for a benchmark on a cluster shape
//! planlat train --benchmark gpt-1.3B --hosts 2 --devices-per-host 2 --storage-dir ./models
//!
//! # Search the plan space with the trained predictor
//! planlat search --benchmark gpt-1.3B --top 10
//!
//! # Predict latencies for hand-authored plans
//! planlat predict --benchmark gpt-1.3B --plans plans.json
//!
//! # Inspect benchmarks and stored artifacts
//! planlat inspect --benchmark moe-1.3B
//! ```

mod commands;

use clap::{Args, Parser, Subcommand};
use plan_ir::DeviceMesh;

#[derive(Parser)]
#[command(
    name = "planlat",
    about = "Learned latency prediction and plan search for hybrid-parallel training",
    version,
    author
)]
struct Cli {
    /// Path to a TOML trainer configuration file.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Cluster shape shared by the subcommands. Together with the
/// benchmark name it forms the artifact-store key.
#[derive(Args)]
struct MeshArgs {
    /// Number of hosts in the cluster.
    #[arg(long, default_value_t = 2)]
    hosts: usize,

    /// Accelerator devices per host.
    #[arg(long, default_value_t = 2)]
    devices_per_host: usize,

    /// Accelerator label (e.g., "a100").
    #[arg(long, default_value = "a100")]
    accelerator: String,
}

impl MeshArgs {
    fn mesh(&self) -> DeviceMesh {
        DeviceMesh::new(self.hosts, self.devices_per_host, &self.accelerator)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train a latency predictor for a benchmark, or load the stored one.
    Train {
        /// Benchmark model (gpt-350M, gpt-1.3B, moe-380M, moe-1.3B).
        #[arg(short, long, default_value = "gpt-1.3B")]
        benchmark: String,

        #[command(flatten)]
        mesh: MeshArgs,

        /// Artifact storage directory (default: $PLANLAT_MODEL_DIR or ./models).
        #[arg(short, long)]
        storage_dir: Option<std::path::PathBuf>,

        /// Replay measurements from a JSON cache instead of the
        /// synthetic profiler.
        #[arg(long)]
        measurements: Option<std::path::PathBuf>,

        /// Retrain even if a stored artifact exists.
        #[arg(long)]
        fresh: bool,

        /// Allow replacing an existing artifact.
        #[arg(long)]
        overwrite: bool,
    },

    /// Search the plan space with a trained predictor.
    Search {
        /// Benchmark model (gpt-350M, gpt-1.3B, moe-380M, moe-1.3B).
        #[arg(short, long, default_value = "gpt-1.3B")]
        benchmark: String,

        #[command(flatten)]
        mesh: MeshArgs,

        /// Artifact storage directory (default: $PLANLAT_MODEL_DIR or ./models).
        #[arg(short, long)]
        storage_dir: Option<std::path::PathBuf>,

        /// Evaluation budget; a larger space is sampled down to this
        /// many candidates (seeded, reproducible).
        #[arg(long)]
        budget: Option<usize>,

        /// Seed for budget-limited sampling.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of ranking rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Emit the full outcome as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Predict latencies for hand-authored plans from a JSON file.
    Predict {
        /// Benchmark model the plans target.
        #[arg(short, long, default_value = "gpt-1.3B")]
        benchmark: String,

        #[command(flatten)]
        mesh: MeshArgs,

        /// Artifact storage directory (default: $PLANLAT_MODEL_DIR or ./models).
        #[arg(short, long)]
        storage_dir: Option<std::path::PathBuf>,

        /// JSON file holding an array of execution plans.
        #[arg(short, long)]
        plans: std::path::PathBuf,
    },

    /// Inspect benchmark presets, search spaces, and stored artifacts.
    Inspect {
        /// Limit to one benchmark (all presets otherwise).
        #[arg(short, long)]
        benchmark: Option<String>,

        #[command(flatten)]
        mesh: MeshArgs,

        /// Artifact storage directory (default: $PLANLAT_MODEL_DIR or ./models).
        #[arg(short, long)]
        storage_dir: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Train {
            benchmark,
            mesh,
            storage_dir,
            measurements,
            fresh,
            overwrite,
        } => {
            commands::train::execute(
                benchmark,
                mesh.mesh(),
                commands::resolve_storage_dir(storage_dir),
                cli.config,
                measurements,
                fresh,
                overwrite,
            )
            .await
        }
        Commands::Search {
            benchmark,
            mesh,
            storage_dir,
            budget,
            seed,
            top,
            json,
        } => {
            commands::search::execute(
                benchmark,
                mesh.mesh(),
                commands::resolve_storage_dir(storage_dir),
                budget,
                seed,
                top,
                json,
            )
            .await
        }
        Commands::Predict {
            benchmark,
            mesh,
            storage_dir,
            plans,
        } => {
            commands::predict::execute(
                benchmark,
                mesh.mesh(),
                commands::resolve_storage_dir(storage_dir),
                plans,
            )
            .await
        }
        Commands::Inspect {
            benchmark,
            mesh,
            storage_dir,
        } => {
            commands::inspect::execute(
                benchmark,
                mesh.mesh(),
                commands::resolve_storage_dir(storage_dir),
            )
            .await
        }
    }
}
