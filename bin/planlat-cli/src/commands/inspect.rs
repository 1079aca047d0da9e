// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `planlat inspect` command: benchmarks, search spaces, and artifacts.
//!
//! Prints the benchmark presets (or one, with its operator breakdown),
//! the size of the search space on the given cluster shape, and the
//! artifacts currently in the store.

use artifact_store::ArtifactStore;
use graph_encode::{FEATURE_SCHEMA_VERSION, FEATURE_WIDTH};
use plan_ir::{DeviceMesh, ModelSpec};
use plan_search::SearchSpace;
use std::path::PathBuf;

pub async fn execute(
    benchmark: Option<String>,
    mesh: DeviceMesh,
    storage_dir: PathBuf,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              planlat · Inspector                    ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Benchmarks ─────────────────────────────────────────────
    match &benchmark {
        Some(name) => {
            let spec = super::resolve_benchmark(name)?;
            println!("  {}", spec.summary());

            let ops = spec.operators();
            println!("   Operators: {} ({} layers × 2)", ops.len(), spec.num_layers);
            let space = SearchSpace::new(spec, mesh.clone());
            println!(
                "   Search space on {}: {} feasible candidates",
                mesh.signature(),
                space.size(),
            );
        }
        None => {
            println!("  Benchmarks:");
            for name in ModelSpec::preset_names() {
                let spec = ModelSpec::by_name(name).expect("preset names resolve");
                let size = SearchSpace::new(spec.clone(), mesh.clone()).size();
                println!("   {}  ({} candidates on {})", spec.summary(), size, mesh.signature());
            }
        }
    }
    println!();
    println!("  Encoder schema: v{FEATURE_SCHEMA_VERSION} (feature width {FEATURE_WIDTH})");
    println!();

    // ── Stored artifacts ───────────────────────────────────────
    let store = ArtifactStore::open(&storage_dir)?;
    let artifacts = store.list()?;
    if artifacts.is_empty() {
        println!("  No artifacts in {}", storage_dir.display());
    } else {
        println!("  Artifacts in {}:", storage_dir.display());
        println!(
            "  {:<14} {:<14} {:>8} {:>8}",
            "Benchmark", "Cluster", "Schema", "Width",
        );
        println!("  {}", "-".repeat(48));
        for meta in &artifacts {
            println!(
                "  {:<14} {:<14} {:>8} {:>8}",
                meta.benchmark,
                meta.cluster,
                format!("v{}", meta.schema_version),
                meta.model.feature_width,
            );
        }
    }
    println!();
    Ok(())
}
