// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # cost-model
//!
//! The learned latency predictor: a single-head attention regressor
//! over encoded plan graphs, with hand-written forward and backward
//! passes over dense f32 matrices.
//!
//! - [`LatencyModel::predict`] maps an [`graph_encode::EncodedGraph`]
//!   to a latency in seconds (finite, non-negative).
//! - [`fit`] / [`fit_from`] train a fresh or warm-started model against
//!   observed latencies with full-batch Adam.
//! - [`CancelToken`] provides cooperative cancellation at epoch
//!   boundaries.
//!
//! The model checks the feature schema of every input and refuses
//! mismatched encodings instead of silently mis-predicting.

mod cancel;
mod error;
mod matrix;
mod model;
mod ops;
mod optim;
mod train;

pub use cancel::CancelToken;
pub use error::ModelError;
pub use matrix::Matrix;
pub use model::{LatencyModel, ModelConfig, Normalization, Provenance};
pub use train::{
    fit, fit_from, fit_from_with_hook, fit_with_hook, EpochHook, TrainConfig, TrainReport,
    TrainingExample,
};
