// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node feature extraction.
//!
//! Every node becomes a fixed-width `f32` vector. The layout below *is*
//! the feature schema: any change to it must bump
//! [`FEATURE_SCHEMA_VERSION`], which the artifact store checks so that a
//! predictor trained against one layout is never fed another.
//!
//! # Layout (version 2)
//!
//! | slots   | content                                            |
//! |---------|----------------------------------------------------|
//! | 0..3    | one-hot compute kind (attention, ffn, moe-ffn)     |
//! | 3..8    | one-hot collective kind (ar, ag, rs, a2a, p2p)     |
//! | 8       | sink flag                                          |
//! | 9       | log-scaled per-device flops                        |
//! | 10      | log-scaled bytes (parameters or transfer volume)   |
//! | 11..13  | log-scaled data-/tensor-parallel degree            |
//! | 13      | stage position fraction                            |
//! | 14      | topological depth fraction                         |
//! | 15      | log-scaled micro-batch count                       |

use plan_ir::{CollectiveKind, NodeKind, OpKind, PlanGraph, PlanNode};

/// Version of the feature layout produced by this module.
pub const FEATURE_SCHEMA_VERSION: u32 = 2;

/// Width of every node feature vector.
pub const FEATURE_WIDTH: usize = 16;

/// Divisor that keeps `ln(1 + flops)` roughly in `[0, 1]` for realistic
/// per-device costs (up to ~1e17 flops).
const LOG_COST_SCALE: f32 = 40.0;

/// Divisor for log-scaled parallel degrees and micro-batch counts.
const LOG_DEGREE_SCALE: f32 = 8.0;

/// Writes the feature vector for `node` into `out`.
///
/// `out` must be exactly [`FEATURE_WIDTH`] long. `depth_frac` is the
/// node's topological depth divided by the node count.
pub(crate) fn write_features(node: &PlanNode, graph: &PlanGraph, depth_frac: f32, out: &mut [f32]) {
    debug_assert_eq!(out.len(), FEATURE_WIDTH);
    out.fill(0.0);

    match node.kind {
        NodeKind::Compute(kind) => {
            let slot = match kind {
                OpKind::Attention => 0,
                OpKind::FeedForward => 1,
                OpKind::MoeFeedForward => 2,
            };
            out[slot] = 1.0;
        }
        NodeKind::Collective(kind) => {
            let slot = match kind {
                CollectiveKind::AllReduce => 3,
                CollectiveKind::AllGather => 4,
                CollectiveKind::ReduceScatter => 5,
                CollectiveKind::AllToAll => 6,
                CollectiveKind::PointToPoint => 7,
            };
            out[slot] = 1.0;
        }
        NodeKind::Sink => out[8] = 1.0,
    }

    out[9] = log_scaled(node.flops, LOG_COST_SCALE);
    out[10] = log_scaled(node.bytes, LOG_COST_SCALE);
    out[11] = log_scaled(node.data_parallel as u64, LOG_DEGREE_SCALE);
    out[12] = log_scaled(node.tensor_parallel as u64, LOG_DEGREE_SCALE);
    out[13] = if graph.num_stages > 1 {
        node.stage as f32 / (graph.num_stages - 1) as f32
    } else {
        0.0
    };
    out[14] = depth_frac;
    out[15] = log_scaled(graph.num_micro_batches as u64, LOG_DEGREE_SCALE);
}

#[inline]
fn log_scaled(value: u64, scale: f32) -> f32 {
    (1.0 + value as f32).ln() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_ir::{DeviceMesh, ExecutionPlan, GraphBuilder, ModelSpec};

    fn sample_graph() -> PlanGraph {
        let spec = ModelSpec::by_name("moe-380M").unwrap();
        let mesh = DeviceMesh::new(1, 4, "a100");
        let plan = ExecutionPlan::uniform(2, 2, 1, mesh, spec.num_layers, 8).unwrap();
        GraphBuilder::build(&plan, &spec).unwrap()
    }

    #[test]
    fn test_one_hot_is_exclusive() {
        let graph = sample_graph();
        let mut buf = [0.0f32; FEATURE_WIDTH];
        for node in &graph.nodes {
            write_features(node, &graph, 0.5, &mut buf);
            let hot: f32 = buf[0..9].iter().sum();
            assert_eq!(hot, 1.0, "node {} has {hot} kind slots set", node.id);
        }
    }

    #[test]
    fn test_features_bounded_and_finite() {
        let graph = sample_graph();
        let mut buf = [0.0f32; FEATURE_WIDTH];
        for node in &graph.nodes {
            write_features(node, &graph, 1.0, &mut buf);
            for (i, &v) in buf.iter().enumerate() {
                assert!(v.is_finite(), "slot {i} not finite");
                assert!((-0.01..=2.0).contains(&v), "slot {i} out of range: {v}");
            }
        }
    }

    #[test]
    fn test_degree_slots_grow_with_degrees() {
        let graph = sample_graph();
        let node = &graph.nodes[0];
        let mut buf = [0.0f32; FEATURE_WIDTH];
        write_features(node, &graph, 0.0, &mut buf);
        // dp=2 and tp=2 both land above zero and below the 64-degree cap.
        assert!(buf[11] > 0.0 && buf[11] < 1.0);
        assert!(buf[12] > 0.0 && buf[12] < 1.0);
    }
}
