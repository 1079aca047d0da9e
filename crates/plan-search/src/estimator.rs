// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The estimator seam between search and the trained predictor.
//!
//! Search only needs "encoded plan → predicted seconds". Putting that
//! behind a trait keeps the loop testable with stub predictors and lets
//! the trained [`LatencyModel`] plug in unchanged.

use cost_model::{LatencyModel, ModelError};
use graph_encode::EncodedGraph;
use plan_ir::ExecutionPlan;

/// Predicts the latency of a candidate plan.
///
/// Implementations must be pure and safe to call concurrently from the
/// search worker pool (`&self`, `Send + Sync`).
pub trait LatencyEstimator: Send + Sync {
    /// Estimated latency in seconds for `plan`, given its encoding.
    fn estimate(&self, plan: &ExecutionPlan, encoded: &EncodedGraph) -> Result<f64, ModelError>;
}

impl LatencyEstimator for LatencyModel {
    fn estimate(&self, _plan: &ExecutionPlan, encoded: &EncodedGraph) -> Result<f64, ModelError> {
        self.predict(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cost_model::ModelConfig;
    use graph_encode::GraphEncoder;
    use plan_ir::{DeviceMesh, GraphBuilder, ModelSpec};

    #[test]
    fn test_model_implements_estimator() {
        let spec = ModelSpec::by_name("gpt-350M").unwrap();
        let mesh = DeviceMesh::new(2, 2, "a100");
        let plan = ExecutionPlan::uniform(2, 2, 1, mesh, 24, 16).unwrap();
        let graph = GraphBuilder::build(&plan, &spec).unwrap();
        let encoded = GraphEncoder::default().encode(&graph).unwrap();

        let model = LatencyModel::new(ModelConfig::default(), 5);
        let estimator: &dyn LatencyEstimator = &model;
        let latency = estimator.estimate(&plan, &encoded).unwrap();
        assert!(latency.is_finite() && latency >= 0.0);
        assert_eq!(latency, model.predict(&encoded).unwrap());
    }
}
