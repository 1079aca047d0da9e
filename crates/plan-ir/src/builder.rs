// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Lowers an execution plan to its plan graph.
//!
//! The builder is a pure, deterministic transformation: identical
//! `(plan, spec)` inputs always produce identical graphs, node ids
//! assigned in stage-major, operator-major order. This is what makes
//! downstream encoding reproducible.
//!
//! # Lowering rules
//!
//! Per stage, in operator order:
//! - each model operator becomes one compute node carrying its
//!   per-device cost (`flops / (dp·tp)`, parameters sharded across the
//!   tensor-parallel group);
//! - a tensor-parallel stage (`tp > 1`) inserts an all-reduce node after
//!   every compute node (partial-sum reduction across the group);
//! - a routed expert block is preceded by an all-to-all node (token
//!   dispatch across the expert group).
//!
//! Between stages, the boundary activation travels over a point-to-point
//! edge. Each data-parallel stage synchronises its own gradients with a
//! reduce-scatter node followed by an all-gather hanging off the stage
//! tail (the reduce-scatter/all-gather split matches how the profiled
//! runtime synchronises gradients), overlapping with later stages'
//! compute. A single sink node joins the last stage tail and every
//! gradient branch.
//!
//! Edge and collective volumes are per-iteration byte estimates divided
//! across the owning stage's device shard.

use crate::{
    CollectiveKind, ExecutionPlan, ModelSpec, NodeKind, OpKind, OperatorDef, PlanEdge, PlanError,
    PlanGraph, PlanNode, StageAssignment,
};

/// Builds [`PlanGraph`]s from execution plans.
pub struct GraphBuilder;

impl GraphBuilder {
    /// Lowers `plan` against `spec` into a validated [`PlanGraph`].
    ///
    /// Fails with a [`PlanError`] if the plan violates the feasibility
    /// invariants (see [`ExecutionPlan::validate`]); nothing is clamped.
    pub fn build(plan: &ExecutionPlan, spec: &ModelSpec) -> Result<PlanGraph, PlanError> {
        plan.validate(spec)?;

        let ops = spec.operators();
        let mut graph = GraphUnderConstruction::default();

        // Tail node and boundary activation volume of each finished stage.
        let mut stage_tails: Vec<(usize, u64)> = Vec::with_capacity(plan.stages.len());

        for (stage_idx, stage) in plan.stages.iter().enumerate() {
            let shard = (stage.data_parallel * stage.tensor_parallel) as u64;
            let mut tail: Option<(usize, u64)> = None;

            let stage_ops = ops
                .iter()
                .filter(|op| op.layer >= stage.layer_start && op.layer < stage.layer_end);

            for op in stage_ops {
                let flow = op.activation_bytes / shard;

                // Expert dispatch precedes the expert block.
                if op.kind == OpKind::MoeFeedForward {
                    let a2a = graph.push_collective(stage_idx, stage, CollectiveKind::AllToAll, flow);
                    graph.link(&mut tail, &stage_tails, stage_idx, a2a, flow);
                }

                let compute = graph.push_node(PlanNode {
                    id: 0, // assigned by push_node
                    kind: NodeKind::Compute(op.kind),
                    stage: stage_idx,
                    data_parallel: stage.data_parallel,
                    tensor_parallel: stage.tensor_parallel,
                    flops: op.flops / shard,
                    bytes: op.param_bytes / stage.tensor_parallel as u64 + flow,
                });
                graph.link(&mut tail, &stage_tails, stage_idx, compute, flow);

                // Partial-sum reduction across the tensor-parallel group.
                if stage.tensor_parallel > 1 {
                    let ar = graph.push_collective(stage_idx, stage, CollectiveKind::AllReduce, flow);
                    graph.link(&mut tail, &stage_tails, stage_idx, ar, flow);
                }
            }

            let (tail_id, boundary) = tail.expect("validated stage has at least one operator");
            stage_tails.push((tail_id, boundary));
        }

        // Per-stage gradient synchronisation: a data-parallel stage
        // reduce-scatters and all-gathers its own gradients as soon as
        // its backward work is done, overlapping later stages.
        let last_stage = plan.stages.len() - 1;
        let stage_params = param_bytes_per_stage(&ops, &plan.stages);
        let mut sink_sources: Vec<usize> = Vec::new();

        for (stage_idx, stage) in plan.stages.iter().enumerate() {
            let (tail_id, _) = stage_tails[stage_idx];
            if stage.data_parallel > 1 {
                let grad_volume = stage_params[stage_idx] / stage.tensor_parallel as u64;
                let rs = graph.push_collective(stage_idx, stage, CollectiveKind::ReduceScatter, grad_volume);
                graph.push_edge(tail_id, rs, grad_volume, Some(CollectiveKind::ReduceScatter));
                let ag = graph.push_collective(stage_idx, stage, CollectiveKind::AllGather, grad_volume);
                graph.push_edge(rs, ag, grad_volume, Some(CollectiveKind::AllGather));
                sink_sources.push(ag);
            } else if stage_idx == last_stage {
                sink_sources.push(tail_id);
            }
        }

        let sink = graph.push_node(PlanNode {
            id: 0,
            kind: NodeKind::Sink,
            stage: last_stage,
            data_parallel: plan.stages[last_stage].data_parallel,
            tensor_parallel: plan.stages[last_stage].tensor_parallel,
            flops: 0,
            bytes: 0,
        });
        for src in sink_sources {
            graph.push_edge(src, sink, 0, None);
        }

        let result = PlanGraph {
            nodes: graph.nodes,
            edges: graph.edges,
            num_stages: plan.stages.len(),
            num_micro_batches: plan.num_micro_batches,
        };
        result.validate()?;
        tracing::debug!("{}", result.summary());
        Ok(result)
    }
}

/// Parameter bytes owned by each stage, in stage order.
fn param_bytes_per_stage(ops: &[OperatorDef], stages: &[StageAssignment]) -> Vec<u64> {
    stages
        .iter()
        .map(|stage| {
            ops.iter()
                .filter(|op| op.layer >= stage.layer_start && op.layer < stage.layer_end)
                .map(|op| op.param_bytes)
                .sum()
        })
        .collect()
}

#[derive(Default)]
struct GraphUnderConstruction {
    nodes: Vec<PlanNode>,
    edges: Vec<PlanEdge>,
}

impl GraphUnderConstruction {
    fn push_node(&mut self, mut node: PlanNode) -> usize {
        let id = self.nodes.len();
        node.id = id;
        self.nodes.push(node);
        id
    }

    fn push_collective(
        &mut self,
        stage_idx: usize,
        stage: &StageAssignment,
        kind: CollectiveKind,
        volume: u64,
    ) -> usize {
        self.push_node(PlanNode {
            id: 0,
            kind: NodeKind::Collective(kind),
            stage: stage_idx,
            data_parallel: stage.data_parallel,
            tensor_parallel: stage.tensor_parallel,
            flops: 0,
            bytes: volume,
        })
    }

    fn push_edge(&mut self, src: usize, dst: usize, volume: u64, pattern: Option<CollectiveKind>) {
        self.edges.push(PlanEdge {
            src,
            dst,
            volume_bytes: volume,
            pattern,
        });
    }

    /// Chains `node` onto the current stage tail, or onto the previous
    /// stage's tail over a point-to-point edge when the stage is empty.
    /// Collective targets record their pattern on the incoming edge.
    fn link(
        &mut self,
        tail: &mut Option<(usize, u64)>,
        finished_stages: &[(usize, u64)],
        stage_idx: usize,
        node: usize,
        out_volume: u64,
    ) {
        let pattern = match self.nodes[node].kind {
            NodeKind::Collective(kind) => Some(kind),
            _ => None,
        };
        match *tail {
            Some((prev, volume)) => self.push_edge(prev, node, volume, pattern),
            None if stage_idx > 0 => {
                let (prev_tail, boundary) = finished_stages[stage_idx - 1];
                self.push_edge(prev_tail, node, boundary, Some(CollectiveKind::PointToPoint));
            }
            None => {} // Stage 0 head: graph input, no incoming edge.
        }
        *tail = Some((node, out_volume));
    }
}
