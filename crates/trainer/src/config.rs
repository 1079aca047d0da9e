// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Trainer configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! storage_dir = "./models"
//! reuse_pretrained = true
//! warm_start = false
//! overwrite = false
//! sample_fraction = 0.3
//! seed = 42
//! measure_timeout_ms = 30000
//! measure_attempts = 3
//! checkpoint_every = 100
//!
//! [train]
//! epochs = 300
//! learning_rate = 0.01
//! min_examples = 8
//! seed = 42
//! log_every = 50
//! ```

use crate::TrainError;
use cost_model::TrainConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the training pipeline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrainerConfig {
    /// Where trained artifacts are written and read.
    pub storage_dir: PathBuf,
    /// If a compatible artifact exists, load it and skip training.
    #[serde(default = "default_true")]
    pub reuse_pretrained: bool,
    /// If an artifact exists and `reuse_pretrained` is off, continue
    /// training from its parameters instead of starting fresh.
    #[serde(default)]
    pub warm_start: bool,
    /// Allow replacing an existing artifact when persisting.
    #[serde(default)]
    pub overwrite: bool,
    /// Seeded fraction of the candidate plan list to actually measure.
    #[serde(default = "default_fraction")]
    pub sample_fraction: f64,
    /// Seed for plan subsampling.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Per-attempt measurement timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub measure_timeout_ms: u64,
    /// Measurement attempts per plan (including the first).
    #[serde(default = "default_attempts")]
    pub measure_attempts: usize,
    /// Persist a checkpoint every N epochs (`None` disables).
    #[serde(default)]
    pub checkpoint_every: Option<usize>,
    /// Predictor fitting hyper-parameters.
    #[serde(default)]
    pub train: TrainConfig,
}

fn default_true() -> bool {
    true
}
fn default_fraction() -> f64 {
    1.0
}
fn default_seed() -> u64 {
    42
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_attempts() -> usize {
    3
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./models"),
            reuse_pretrained: true,
            warm_start: false,
            overwrite: false,
            sample_fraction: 1.0,
            seed: 42,
            measure_timeout_ms: 30_000,
            measure_attempts: 3,
            checkpoint_every: None,
            train: TrainConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, TrainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, TrainError> {
        toml::from_str(toml_str).map_err(|e| TrainError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, TrainError> {
        toml::to_string_pretty(self)
            .map_err(|e| TrainError::Config(format!("TOML serialise error: {e}")))
    }

    /// The per-attempt measurement timeout.
    pub fn measure_timeout(&self) -> Duration {
        Duration::from_millis(self.measure_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = TrainerConfig::default();
        assert!(c.reuse_pretrained);
        assert!(!c.overwrite);
        assert_eq!(c.sample_fraction, 1.0);
        assert_eq!(c.measure_attempts, 3);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
storage_dir = "/tmp/models"
reuse_pretrained = false
sample_fraction = 0.25
measure_attempts = 5

[train]
epochs = 10
learning_rate = 0.001
min_examples = 4
seed = 7
log_every = 2
"#;
        let c = TrainerConfig::from_toml(toml).unwrap();
        assert_eq!(c.storage_dir, PathBuf::from("/tmp/models"));
        assert!(!c.reuse_pretrained);
        assert_eq!(c.sample_fraction, 0.25);
        assert_eq!(c.measure_attempts, 5);
        assert_eq!(c.train.epochs, 10);
        assert_eq!(c.train.min_examples, 4);
    }

    #[test]
    fn test_toml_roundtrip() {
        let c = TrainerConfig {
            checkpoint_every: Some(50),
            ..Default::default()
        };
        let toml = c.to_toml().unwrap();
        let back = TrainerConfig::from_toml(&toml).unwrap();
        assert_eq!(back.checkpoint_every, Some(50));
        assert_eq!(back.train.epochs, c.train.epochs);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let c = TrainerConfig::from_toml(r#"storage_dir = "./m""#).unwrap();
        assert!(c.reuse_pretrained);
        assert_eq!(c.measure_timeout(), Duration::from_millis(30_000));
    }
}
