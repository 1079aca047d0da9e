// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-encode
//!
//! Turns a [`plan_ir::PlanGraph`] into the numeric representation the
//! latency predictor consumes: a per-node feature matrix plus an
//! attention-bias matrix that reproduces the DAG's partial order.
//!
//! The feature layout is versioned ([`FEATURE_SCHEMA_VERSION`]); the
//! artifact store refuses to load a predictor trained against a
//! different version rather than silently mis-predicting.

mod encoded;
mod encoder;
mod error;
mod features;

pub use encoded::{EncodedGraph, MASKED_BIAS};
pub use encoder::{EncoderConfig, GraphEncoder};
pub use error::EncodeError;
pub use features::{FEATURE_SCHEMA_VERSION, FEATURE_WIDTH};
