// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `planlat train` command: train a predictor or load the stored one.
//!
//! With `--measurements` the corpus replays a recorded JSON measurement
//! set; otherwise the synthetic profiler stands in for the real
//! compiler. `--fresh` forces retraining, `--overwrite` confirms
//! replacing an existing artifact.

use artifact_store::{ArtifactKey, ArtifactStore};
use cost_model::{CancelToken, Provenance};
use plan_ir::DeviceMesh;
use plan_search::SearchSpace;
use std::path::PathBuf;
use std::sync::Arc;
use trainer::{train_or_load, CachedProfiler, Profiler, SyntheticProfiler, TrainerConfig};

pub async fn execute(
    benchmark: String,
    mesh: DeviceMesh,
    storage_dir: PathBuf,
    config_file: Option<PathBuf>,
    measurements: Option<PathBuf>,
    fresh: bool,
    overwrite: bool,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            planlat · Predictor Training             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let spec = super::resolve_benchmark(&benchmark)?;

    // ── Configuration ──────────────────────────────────────────
    let mut config = match &config_file {
        Some(path) => TrainerConfig::from_file(path)?,
        None => TrainerConfig::default(),
    };
    config.storage_dir = storage_dir;
    if fresh {
        config.reuse_pretrained = false;
    }
    if overwrite {
        config.overwrite = true;
    }

    println!("  Config:");
    println!("   Benchmark: {}", spec.name);
    println!("   Cluster:   {mesh}");
    println!("   Storage:   {}", config.storage_dir.display());
    println!("   Reuse:     {}", config.reuse_pretrained);
    println!("   Epochs:    {}", config.train.epochs);
    println!();

    let store = ArtifactStore::open(&config.storage_dir)?;
    let key = ArtifactKey::new(&spec.name, &mesh.signature());

    // ── Candidate plans ────────────────────────────────────────
    let plans = SearchSpace::new(spec.clone(), mesh).candidates();
    println!("  [1/2] Enumerated {} feasible candidate plans.", plans.len());

    let profiler: Arc<dyn Profiler> = match &measurements {
        Some(path) => {
            let cached = CachedProfiler::from_file(path)?;
            println!("        Replaying {} cached measurements.", cached.len());
            Arc::new(cached)
        }
        None => {
            println!("        Using the synthetic profiler (no cluster attached).");
            Arc::new(SyntheticProfiler::new(spec.clone()).with_noise(0.03, config.seed))
        }
    };
    println!();

    // ── Train or load ──────────────────────────────────────────
    println!("  [2/2] Training predictor for {key}...");
    let cancel = CancelToken::new();
    let predictor =
        train_or_load(&store, &key, &spec, &plans, profiler, &config, &cancel).await?;

    println!();
    match predictor.provenance() {
        Provenance::FreshlyTrained => {
            let metrics = predictor
                .metrics()
                .expect("freshly trained predictor has metrics");
            println!("  Results:");
            println!("   {}", metrics.summary());
        }
        Provenance::LoadedFromStore => {
            println!("  Results:");
            println!("   Reused stored artifact for {key}; pass --fresh to retrain.");
        }
    }
    println!();
    Ok(())
}
