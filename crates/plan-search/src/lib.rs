// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # plan-search
//!
//! Predictor-guided search over the hybrid-parallel plan space.
//!
//! A [`SearchSpace`] enumerates the feasible `(data, tensor, pipeline)`
//! degree combinations for a model on a device mesh; a
//! [`SearchStrategy`] picks the subset to evaluate (everything, or a
//! seeded sample under an evaluation budget); the [`Searcher`] scores
//! candidates concurrently through a [`LatencyEstimator`] and returns
//! the minimum-predicted-latency plan with the full ascending ranking.
//!
//! # Example
//! ```
//! use cost_model::{LatencyModel, ModelConfig};
//! use plan_ir::{DeviceMesh, ModelSpec};
//! use plan_search::{Exhaustive, Searcher, SearchSpace};
//!
//! let spec = ModelSpec::by_name("gpt-350M").unwrap();
//! let mesh = DeviceMesh::new(2, 2, "a100");
//! let space = SearchSpace::new(spec.clone(), mesh);
//!
//! // An untrained model still demonstrates the loop end to end.
//! let model = LatencyModel::new(ModelConfig::default(), 42);
//! let outcome = Searcher::new(spec).search(&space, &Exhaustive, &model).unwrap();
//! println!("{}", outcome.summary());
//! ```

mod error;
mod estimator;
mod searcher;
mod space;
mod strategy;

pub use error::SearchError;
pub use estimator::LatencyEstimator;
pub use searcher::{RankedPlan, SearchOutcome, Searcher};
pub use space::SearchSpace;
pub use strategy::{Exhaustive, SearchStrategy, SeededSample};
