// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the latency predictor.

/// Errors raised by prediction, training, and parameter loading.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The encoded graph's feature schema does not match the model's.
    #[error(
        "feature schema mismatch: model expects schema v{expected_version} (width {expected_width}), \
         got v{actual_version} (width {actual_width})"
    )]
    SchemaMismatch {
        expected_version: u32,
        expected_width: usize,
        actual_version: u32,
        actual_width: usize,
    },

    /// Too few training examples to fit a model.
    #[error("insufficient training data: {got} examples, need at least {min}")]
    InsufficientData { got: usize, min: usize },

    /// A loss or prediction became NaN or infinite.
    #[error("non-finite value during {context}")]
    NonFinite { context: &'static str },

    /// A parameter tensor was missing while restoring a model.
    #[error("missing parameter tensor '{name}'")]
    MissingTensor { name: String },

    /// A parameter tensor had the wrong shape while restoring a model.
    #[error("parameter tensor '{name}' has shape {actual:?}, expected {expected:?}")]
    TensorShape {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}
