// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph encoding.

/// Errors that can occur while encoding a plan graph.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The graph exceeds the encoder's configured node limit.
    #[error("graph too large: {nodes} nodes exceeds the encoder limit of {max}")]
    GraphTooLarge { nodes: usize, max: usize },

    /// The graph has no nodes.
    #[error("cannot encode an empty graph")]
    EmptyGraph,

    /// The graph violates a structural invariant (e.g., contains a cycle).
    #[error("invalid plan graph: {0}")]
    InvalidGraph(#[from] plan_ir::PlanError),
}
