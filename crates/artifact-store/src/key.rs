// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Artifact keys: `(benchmark, cluster signature, feature schema version)`.

use graph_encode::FEATURE_SCHEMA_VERSION;
use std::fmt;

/// Identifies one persisted predictor.
///
/// A key binds the predictor to the benchmark model it was trained for,
/// the cluster it was profiled on, and the feature schema version its
/// inputs were encoded with. All three must match for a load to succeed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ArtifactKey {
    /// Benchmark name (e.g., `"gpt-1.3B"`).
    pub benchmark: String,
    /// Cluster signature (e.g., `"2x2-a100"`), as produced by the
    /// device mesh's `signature()`.
    pub cluster: String,
    /// Feature schema version the predictor expects.
    pub schema_version: u32,
}

impl ArtifactKey {
    /// Creates a key for the current encoder schema.
    pub fn new(benchmark: &str, cluster: &str) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            cluster: cluster.to_string(),
            schema_version: FEATURE_SCHEMA_VERSION,
        }
    }

    /// Overrides the schema version (used by compatibility tests and
    /// migration tooling).
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Filename stem for this key's on-disk records.
    pub fn file_stem(&self) -> String {
        format!("{}__{}__v{}", self.benchmark, self.cluster, self.schema_version)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} (schema v{})", self.benchmark, self.cluster, self.schema_version)
    }
}
