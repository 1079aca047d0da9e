// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `planlat predict` command: latency queries for hand-authored plans.
//!
//! Reads a JSON array of execution plans, loads the trained predictor,
//! and prints one predicted latency per plan — no search involved.
//! Unlike search, an infeasible plan here is an error, not a skip.

use artifact_store::{ArtifactKey, ArtifactStore};
use plan_ir::{DeviceMesh, ExecutionPlan};
use plan_search::Searcher;
use std::path::PathBuf;

pub async fn execute(
    benchmark: String,
    mesh: DeviceMesh,
    storage_dir: PathBuf,
    plans_path: PathBuf,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            planlat · Manual Plan Query              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let spec = super::resolve_benchmark(&benchmark)?;
    let store = ArtifactStore::open(&storage_dir)?;
    let key = ArtifactKey::new(&spec.name, &mesh.signature());

    let model = store.load(&key).map_err(|e| {
        anyhow::anyhow!("no usable predictor for {key}: {e}; run `planlat train` first")
    })?;

    let content = std::fs::read_to_string(&plans_path).map_err(|e| {
        anyhow::anyhow!("cannot read plans file '{}': {e}", plans_path.display())
    })?;
    let plans: Vec<ExecutionPlan> = serde_json::from_str(&content).map_err(|e| {
        anyhow::anyhow!("plans file '{}' is not a JSON plan array: {e}", plans_path.display())
    })?;
    println!("  Loaded {} plans from {}", plans.len(), plans_path.display());
    println!();

    let latencies = Searcher::new(spec).predict_plans(&plans, &model)?;

    println!("  {:<48} {:>12}", "Plan", "Predicted");
    println!("  {}", "-".repeat(62));
    for (plan, latency) in plans.iter().zip(&latencies) {
        println!("  {:<48} {:>10.4}s", plan.summary(), latency);
    }
    println!();
    Ok(())
}
