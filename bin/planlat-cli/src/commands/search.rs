// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `planlat search` command: rank the plan space by predicted latency.
//!
//! Loads the trained predictor for the `(benchmark, cluster)` key and
//! prints the ranking, best plan first. With `--budget` the space is
//! sampled down reproducibly and the output says so.

use artifact_store::{ArtifactKey, ArtifactStore};
use plan_ir::DeviceMesh;
use plan_search::{Exhaustive, SearchSpace, Searcher, SeededSample};
use std::path::PathBuf;

pub async fn execute(
    benchmark: String,
    mesh: DeviceMesh,
    storage_dir: PathBuf,
    budget: Option<usize>,
    seed: u64,
    top: usize,
    json: bool,
) -> anyhow::Result<()> {
    if !json {
        println!("╔══════════════════════════════════════════════════════╗");
        println!("║              planlat · Plan Search                  ║");
        println!("╚══════════════════════════════════════════════════════╝");
        println!();
    }

    let spec = super::resolve_benchmark(&benchmark)?;
    let store = ArtifactStore::open(&storage_dir)?;
    let key = ArtifactKey::new(&spec.name, &mesh.signature());

    let model = store.load(&key).map_err(|e| {
        anyhow::anyhow!("no usable predictor for {key}: {e}; run `planlat train` first")
    })?;
    tracing::debug!("predictor loaded for {key}");

    let space = SearchSpace::new(spec.clone(), mesh);
    if !json {
        println!("  Space: {} feasible candidates for '{}'", space.size(), spec.name);
        println!();
    }

    let searcher = Searcher::new(spec);
    let outcome = match budget {
        Some(budget) => searcher.search(&space, &SeededSample { budget, seed }, &model)?,
        None => searcher.search(&space, &Exhaustive, &model)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    // ── Ranking ────────────────────────────────────────────────
    println!(
        "  {:<4} {:<28} {:>6} {:>12} {:>12}",
        "Rank", "Degrees (per stage)", "µB", "Predicted", "Comm",
    );
    println!("  {}", "-".repeat(68));
    for (rank, entry) in outcome.ranked.iter().take(top).enumerate() {
        let degrees: Vec<String> = entry
            .plan
            .stages
            .iter()
            .map(|s| format!("dp{}×tp{}", s.data_parallel, s.tensor_parallel))
            .collect();
        println!(
            "  {:<4} {:<28} {:>6} {:>10.4}s {:>9.1} MB",
            rank + 1,
            degrees.join(" | "),
            entry.plan.num_micro_batches,
            entry.predicted_latency,
            entry.comm_volume_bytes as f64 / (1024.0 * 1024.0),
        );
    }
    if outcome.ranked.len() > top {
        println!("  ... {} more", outcome.ranked.len() - top);
    }
    println!();

    println!("  {}", outcome.summary());
    println!();
    Ok(())
}
