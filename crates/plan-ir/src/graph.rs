// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Plan graph: a plan lowered to a DAG of computation and communication nodes.
//!
//! Nodes are per-device slices of the model's operators plus the
//! collective operations the chosen parallel strategy induces. Edges are
//! data dependencies annotated with transfer volume and, where the edge
//! crosses a partitioning boundary, the collective pattern it implies.
//!
//! # Invariants
//! - Acyclic.
//! - Exactly one sink node representing plan completion.
//! - Every node reachable from at least one input node.
//!
//! A graph is constructed fresh per [`ExecutionPlan`](crate::ExecutionPlan)
//! by the [`GraphBuilder`](crate::GraphBuilder), consumed by the encoder,
//! and then discarded. It carries no identity of its own.

use crate::{OpKind, PlanError};
use std::fmt;

/// Collective communication patterns induced by partitioning choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectiveKind {
    AllReduce,
    AllGather,
    ReduceScatter,
    AllToAll,
    PointToPoint,
}

impl CollectiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllReduce => "all_reduce",
            Self::AllGather => "all_gather",
            Self::ReduceScatter => "reduce_scatter",
            Self::AllToAll => "all_to_all",
            Self::PointToPoint => "point_to_point",
        }
    }
}

impl fmt::Display for CollectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a graph node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NodeKind {
    /// A per-device slice of a model operator.
    Compute(OpKind),
    /// A collective communication operation.
    Collective(CollectiveKind),
    /// The single sink marking plan completion.
    Sink,
}

/// A node in the plan graph.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlanNode {
    /// Node id: index into [`PlanGraph::nodes`].
    pub id: usize,
    /// What this node computes or communicates.
    pub kind: NodeKind,
    /// Pipeline stage the node belongs to.
    pub stage: usize,
    /// Data-parallel degree of the node's stage.
    pub data_parallel: usize,
    /// Tensor-parallel degree of the node's stage.
    pub tensor_parallel: usize,
    /// Estimated per-device floating-point operations (0 for collectives).
    pub flops: u64,
    /// Bytes touched: per-device parameter + activation bytes for compute
    /// nodes, transfer volume for collective nodes.
    pub bytes: u64,
}

/// A directed dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlanEdge {
    /// Source node id.
    pub src: usize,
    /// Destination node id.
    pub dst: usize,
    /// Data volume carried over this edge in bytes.
    pub volume_bytes: u64,
    /// Collective pattern this edge implies, if it crosses a
    /// partitioning boundary (`None` for plain local dataflow).
    pub pattern: Option<CollectiveKind>,
}

/// The complete DAG for one execution plan.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlanGraph {
    pub nodes: Vec<PlanNode>,
    pub edges: Vec<PlanEdge>,
    /// Number of pipeline stages in the originating plan.
    pub num_stages: usize,
    /// Micro-batch count of the originating plan.
    pub num_micro_batches: usize,
}

impl PlanGraph {
    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Outgoing adjacency lists, indexed by node id.
    pub fn successors(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            out[edge.src].push(edge.dst);
        }
        out
    }

    /// Incoming adjacency lists, indexed by node id.
    pub fn predecessors(&self) -> Vec<Vec<usize>> {
        let mut inc = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            inc[edge.dst].push(edge.src);
        }
        inc
    }

    /// Topological depth of every node (longest path from any input).
    ///
    /// Fails with [`PlanError::CyclicGraph`] if the graph has a cycle.
    pub fn topo_depths(&self) -> Result<Vec<usize>, PlanError> {
        let n = self.nodes.len();
        let successors = self.successors();
        let mut in_degree = vec![0usize; n];
        for edge in &self.edges {
            in_degree[edge.dst] += 1;
        }

        let mut depths = vec![0usize; n];
        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0;

        while let Some(id) = queue.pop() {
            visited += 1;
            for &next in &successors[id] {
                depths[next] = depths[next].max(depths[id] + 1);
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push(next);
                }
            }
        }

        if visited != n {
            return Err(PlanError::CyclicGraph);
        }
        Ok(depths)
    }

    /// Validates the structural invariants.
    ///
    /// # Checks
    /// - The graph is acyclic.
    /// - Exactly one sink node (no outgoing edges).
    /// - Every node is reachable from a stage-0 input: in an acyclic
    ///   graph each node chains back to some zero-in-degree node, so the
    ///   check is that all zero-in-degree nodes sit in stage 0.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.topo_depths()?;

        let successors = self.successors();
        let sinks: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| successors[i].is_empty())
            .collect();
        if sinks.len() != 1 {
            return Err(PlanError::SinkCount { count: sinks.len() });
        }

        let predecessors = self.predecessors();
        for node in &self.nodes {
            if predecessors[node.id].is_empty() && node.stage != 0 {
                return Err(PlanError::UnreachableNode { id: node.id });
            }
        }

        Ok(())
    }

    /// Total communication volume: the sum of edge volumes that carry a
    /// collective pattern. Used as the structural tie-breaker in search.
    pub fn total_comm_volume(&self) -> u64 {
        self.edges
            .iter()
            .filter(|e| e.pattern.is_some())
            .map(|e| e.volume_bytes)
            .sum()
    }

    /// Returns a summary string for logging.
    pub fn summary(&self) -> String {
        let collectives = self
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Collective(_)))
            .count();
        format!(
            "PlanGraph: {} nodes ({} collectives), {} edges, {} stages, {:.1} MB comm",
            self.num_nodes(),
            collectives,
            self.edges.len(),
            self.num_stages,
            self.total_comm_volume() as f64 / (1024.0 * 1024.0),
        )
    }
}
