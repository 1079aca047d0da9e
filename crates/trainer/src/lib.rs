// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # trainer
//!
//! The training pipeline: collects `(plan, latency)` examples through a
//! [`Profiler`] (the opaque stand-in for the external DL training
//! compiler), fits the latency predictor, and persists the result in the
//! artifact store.
//!
//! The pipeline itself is type-state–enforced
//! (`Collecting → Collected → Trained`); [`train_or_load`] is the
//! orchestration entry point that reuses compatible stored artifacts or
//! trains and persists under a per-key advisory lock.
//!
//! # Example
//! ```no_run
//! use artifact_store::{ArtifactKey, ArtifactStore};
//! use cost_model::CancelToken;
//! use plan_ir::{DeviceMesh, ExecutionPlan, ModelSpec};
//! use std::sync::Arc;
//! use trainer::{train_or_load, SyntheticProfiler, TrainerConfig};
//!
//! # async fn example() -> Result<(), trainer::TrainError> {
//! let spec = ModelSpec::by_name("gpt-350M").unwrap();
//! let mesh = DeviceMesh::new(2, 2, "a100");
//! let plans = vec![ExecutionPlan::uniform(2, 2, 1, mesh.clone(), 24, 16).unwrap()];
//!
//! let store = ArtifactStore::open("./models")?;
//! let key = ArtifactKey::new(&spec.name, &mesh.signature());
//! let predictor = train_or_load(
//!     &store,
//!     &key,
//!     &spec,
//!     &plans,
//!     Arc::new(SyntheticProfiler::new(spec.clone())),
//!     &TrainerConfig::default(),
//!     &CancelToken::new(),
//! )
//! .await?;
//! println!("provenance: {:?}", predictor.provenance());
//! # Ok(())
//! # }
//! ```

mod config;
mod corpus;
mod error;
mod metrics;
mod pipeline;
mod profiler;

pub use config::TrainerConfig;
pub use corpus::{CollectionReport, Corpus, SkippedPlan};
pub use error::TrainError;
pub use metrics::TrainingMetrics;
pub use pipeline::{
    train_or_load, Collected, Collecting, PipelineState, Trained, TrainedPredictor,
    TrainingPipeline,
};
pub use profiler::{
    measure_with_retry, CachedProfiler, MeasureFailure, Profiler, RetryPolicy, SyntheticProfiler,
};
