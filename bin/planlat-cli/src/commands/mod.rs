// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CLI subcommand implementations.

pub mod inspect;
pub mod predict;
pub mod search;
pub mod train;

use std::path::PathBuf;

/// Initialises tracing from the `-v` count. `RUST_LOG` takes precedence
/// when set.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves the artifact storage directory: the flag if given, then the
/// `PLANLAT_MODEL_DIR` environment variable, then `./models`.
pub fn resolve_storage_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("PLANLAT_MODEL_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./models"))
}

/// Looks up a benchmark preset, listing the known names on failure.
pub fn resolve_benchmark(name: &str) -> anyhow::Result<plan_ir::ModelSpec> {
    plan_ir::ModelSpec::by_name(name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown benchmark '{name}' (known: {})",
            plan_ir::ModelSpec::preset_names().join(", "),
        )
    })
}
