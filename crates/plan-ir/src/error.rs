// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for plan validation and graph construction.
//!
//! Every variant here is a structural or feasibility violation of an
//! execution plan. Callers that iterate over candidate plans (the search
//! loop) catch these per candidate and skip; callers holding a single
//! plan surface them directly.

/// Errors raised while validating an execution plan or building its graph.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The plan contains no stages.
    #[error("invalid plan: plan contains no stages")]
    EmptyPlan,

    /// The stage list does not cover the model's layers contiguously.
    #[error("invalid plan: stage layer ranges are inconsistent with model '{model}': {detail}")]
    LayerCoverage { model: String, detail: String },

    /// A parallel degree is zero or incompatible with the device mesh.
    #[error("invalid plan: stage {stage} has an invalid parallel degree: {detail}")]
    InvalidDegree { stage: usize, detail: String },

    /// The plan's device accounting does not match the mesh.
    #[error("invalid plan: plan does not fit device mesh: {detail}")]
    MeshMismatch { detail: String },

    /// The constructed graph contains a cycle.
    #[error("plan graph contains a cycle")]
    CyclicGraph,

    /// A graph node is unreachable from the input nodes.
    #[error("plan graph node {id} is unreachable from the inputs")]
    UnreachableNode { id: usize },

    /// The graph does not have exactly one sink node.
    #[error("plan graph has {count} sink nodes, expected exactly one")]
    SinkCount { count: usize },
}
