// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The graph encoder: plan graph → numeric tensors.
//!
//! # Node ordering
//!
//! Nodes are encoded in a *stable topological order*: sorted by
//! `(topological depth, node id)`. Builder ids are themselves
//! deterministic, so the same graph always encodes to byte-identical
//! tensors, which is what makes predictions and search rankings
//! reproducible.
//!
//! # Attention bias policy
//!
//! The bias matrix reproduces the DAG's partial order: two positions may
//! attend to each other iff their nodes are *comparable* (one is an
//! ancestor of the other, or they are the same node); incomparable pairs
//! get [`MASKED_BIAS`]. Attention is deliberately bidirectional along
//! dependency chains: the predictor regresses a single whole-plan
//! scalar, so there is no future-stage information to leak, and letting
//! late nodes inform early ones improves the pooled representation.

use crate::{
    features::write_features, EncodeError, EncodedGraph, FEATURE_SCHEMA_VERSION, FEATURE_WIDTH,
    MASKED_BIAS,
};
use plan_ir::PlanGraph;

/// Configuration for the encoder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EncoderConfig {
    /// Graphs with more nodes than this are rejected with
    /// [`EncodeError::GraphTooLarge`].
    pub max_nodes: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { max_nodes: 512 }
    }
}

/// Encodes plan graphs into [`EncodedGraph`]s.
#[derive(Debug, Clone, Default)]
pub struct GraphEncoder {
    config: EncoderConfig,
}

impl GraphEncoder {
    /// Creates an encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// The configured node limit.
    pub fn max_nodes(&self) -> usize {
        self.config.max_nodes
    }

    /// Encodes a plan graph.
    ///
    /// # Errors
    /// - [`EncodeError::EmptyGraph`] for graphs without nodes.
    /// - [`EncodeError::GraphTooLarge`] above the configured limit.
    /// - [`EncodeError::InvalidGraph`] if the graph is cyclic.
    pub fn encode(&self, graph: &PlanGraph) -> Result<EncodedGraph, EncodeError> {
        let n = graph.num_nodes();
        if n == 0 {
            return Err(EncodeError::EmptyGraph);
        }
        if n > self.config.max_nodes {
            return Err(EncodeError::GraphTooLarge {
                nodes: n,
                max: self.config.max_nodes,
            });
        }

        let depths = graph.topo_depths()?;

        // Stable topological order: (depth, id).
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&id| (depths[id], id));
        // position[id] = row index in the encoding.
        let mut position = vec![0usize; n];
        for (pos, &id) in order.iter().enumerate() {
            position[id] = pos;
        }

        // Feature matrix.
        let mut features = vec![0.0f32; n * FEATURE_WIDTH];
        for &id in &order {
            let row = position[id];
            let depth_frac = depths[id] as f32 / n as f32;
            write_features(
                &graph.nodes[id],
                graph,
                depth_frac,
                &mut features[row * FEATURE_WIDTH..(row + 1) * FEATURE_WIDTH],
            );
        }

        // Ancestor closure, walked in topological order so each node's
        // set is complete before it is propagated.
        let successors = graph.successors();
        let mut ancestors = vec![vec![false; n]; n];
        for &id in &order {
            for &next in &successors[id] {
                // `next` inherits `id`'s ancestors plus `id` itself.
                let (from, to) = if id < next {
                    let (a, b) = ancestors.split_at_mut(next);
                    (&a[id], &mut b[0])
                } else {
                    let (a, b) = ancestors.split_at_mut(id);
                    (&b[0], &mut a[next])
                };
                for k in 0..n {
                    to[k] |= from[k];
                }
                ancestors[next][id] = true;
            }
        }

        // Bias: 0 for comparable pairs, masked otherwise.
        let mut bias = vec![MASKED_BIAS; n * n];
        for i in 0..n {
            for j in 0..n {
                let comparable = i == j || ancestors[i][j] || ancestors[j][i];
                if comparable {
                    bias[position[i] * n + position[j]] = 0.0;
                }
            }
        }

        let encoded_depths: Vec<usize> = order.iter().map(|&id| depths[id]).collect();

        tracing::trace!(nodes = n, "encoded plan graph");
        Ok(EncodedGraph {
            num_nodes: n,
            feature_width: FEATURE_WIDTH,
            schema_version: FEATURE_SCHEMA_VERSION,
            features,
            bias,
            depths: encoded_depths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_ir::{DeviceMesh, ExecutionPlan, GraphBuilder, ModelSpec};

    fn sample_graph() -> PlanGraph {
        let spec = ModelSpec::by_name("gpt-350M").unwrap();
        let mesh = DeviceMesh::new(2, 2, "a100");
        let plan = ExecutionPlan::uniform(2, 1, 2, mesh, spec.num_layers, 16).unwrap();
        GraphBuilder::build(&plan, &spec).unwrap()
    }

    #[test]
    fn test_encode_shapes() {
        let graph = sample_graph();
        let encoded = GraphEncoder::default().encode(&graph).unwrap();
        let n = graph.num_nodes();
        assert_eq!(encoded.num_nodes, n);
        assert_eq!(encoded.feature_width, FEATURE_WIDTH);
        assert_eq!(encoded.features.len(), n * FEATURE_WIDTH);
        assert_eq!(encoded.bias.len(), n * n);
        assert_eq!(encoded.schema_version, FEATURE_SCHEMA_VERSION);
    }

    #[test]
    fn test_encode_deterministic() {
        let graph = sample_graph();
        let encoder = GraphEncoder::default();
        let a = encoder.encode(&graph).unwrap();
        let b = encoder.encode(&graph).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_depths_non_decreasing() {
        let graph = sample_graph();
        let encoded = GraphEncoder::default().encode(&graph).unwrap();
        for pair in encoded.depths.windows(2) {
            assert!(pair[0] <= pair[1], "encoded order must be topological");
        }
    }

    #[test]
    fn test_chain_is_fully_comparable() {
        // A single-device plan lowers to a pure chain, so every pair of
        // nodes is comparable and nothing is masked.
        let spec = ModelSpec::by_name("gpt-350M").unwrap();
        let mesh = DeviceMesh::new(1, 1, "a100");
        let plan = ExecutionPlan::uniform(1, 1, 1, mesh, spec.num_layers, 4).unwrap();
        let graph = GraphBuilder::build(&plan, &spec).unwrap();
        let encoded = GraphEncoder::default().encode(&graph).unwrap();

        for i in 0..encoded.num_nodes {
            for j in 0..encoded.num_nodes {
                assert!(encoded.attends(i, j), "chain positions {i} and {j} masked");
            }
        }
    }

    #[test]
    fn test_parallel_branches_are_masked() {
        // With dp > 1 the gradient reduce-scatter is fed by both stage
        // tails, so the two stages' interiors stay comparable only along
        // the pipeline chain; every graph with branches must mask at
        // least one pair. Build a two-stage dp plan and check the mask
        // is not all-zero.
        let spec = ModelSpec::by_name("gpt-350M").unwrap();
        let mesh = DeviceMesh::new(2, 2, "a100");
        let plan = ExecutionPlan::uniform(2, 1, 2, mesh, spec.num_layers, 16).unwrap();
        let graph = GraphBuilder::build(&plan, &spec).unwrap();
        let encoded = GraphEncoder::default().encode(&graph).unwrap();

        let masked = encoded.bias.iter().filter(|&&b| b == MASKED_BIAS).count();
        assert!(masked > 0, "expected at least one masked pair");
    }

    #[test]
    fn test_graph_too_large() {
        let graph = sample_graph();
        let encoder = GraphEncoder::new(EncoderConfig { max_nodes: 4 });
        assert!(matches!(
            encoder.encode(&graph),
            Err(EncodeError::GraphTooLarge { max: 4, .. })
        ));
    }

    #[test]
    fn test_empty_graph() {
        let graph = PlanGraph {
            nodes: vec![],
            edges: vec![],
            num_stages: 0,
            num_micro_batches: 1,
        };
        assert!(matches!(
            GraphEncoder::default().encode(&graph),
            Err(EncodeError::EmptyGraph)
        ));
    }
}
