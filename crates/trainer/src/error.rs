// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the training pipeline.
//!
//! Individual measurement failures are *not* errors at this level: they
//! are recovered locally by the collection loop (retry, then exclude the
//! plan) and surfaced as skip counts. The variants here end the whole
//! operation.

/// Errors raised by the training pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// Configuration file or value problem.
    #[error("trainer configuration error: {0}")]
    Config(String),

    /// Every candidate plan was excluded during collection.
    #[error("no training examples collected ({skipped} plans skipped); nothing to fit")]
    NoExamplesCollected { skipped: usize },

    /// The run was cancelled before any training progress was made.
    #[error("training run cancelled before any progress was made")]
    Cancelled,

    /// Fitting or predicting with the cost model failed.
    #[error("predictor error: {0}")]
    Model(#[from] cost_model::ModelError),

    /// Persisting or loading the artifact failed.
    #[error("artifact store error: {0}")]
    Store(#[from] artifact_store::StoreError),
}
