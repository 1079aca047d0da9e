// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for plan search.
//!
//! A single infeasible candidate is never fatal during search: it is
//! skipped and counted. These variants end the whole operation — an
//! empty space, a space where nothing survived, or a predictor whose
//! schema does not match the encoder. Direct manual queries
//! ([`Searcher::predict_plans`](crate::Searcher::predict_plans)) surface
//! per-plan build and encode errors instead of skipping them.

/// Errors raised by the search loop and manual latency queries.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The search space enumerated no candidates at all.
    #[error("search space is empty: no parallel-degree combination fits the mesh")]
    EmptySpace,

    /// Every candidate was skipped during evaluation.
    #[error("no feasible plan: all {candidates} candidates were skipped")]
    NoFeasiblePlan { candidates: usize },

    /// A directly queried plan is infeasible.
    #[error("plan error: {0}")]
    Plan(#[from] plan_ir::PlanError),

    /// A directly queried plan's graph could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] graph_encode::EncodeError),

    /// The predictor rejected an encoding (schema mismatch or
    /// non-finite output). Fatal: retrying other candidates would fail
    /// the same way.
    #[error("predictor error: {0}")]
    Model(#[from] cost_model::ModelError),
}
