// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # plan-ir
//!
//! Intermediate representation for hybrid-parallel training plans.
//!
//! This crate provides:
//! - [`ModelSpec`] — benchmark model descriptions (dense transformer and
//!   mixture-of-experts families) with preset tables.
//! - [`DeviceMesh`] — the logical accelerator grid.
//! - [`ExecutionPlan`] — an immutable candidate parallelisation choice
//!   (per-stage layer ranges and degrees), compared structurally.
//! - [`PlanGraph`] — the plan lowered to a DAG of computation and
//!   communication nodes, ready for encoding.
//! - [`GraphBuilder`] — the deterministic, pure lowering from plan to
//!   graph, with strict feasibility checking.
//!
//! # Example
//! ```
//! use plan_ir::{DeviceMesh, ExecutionPlan, GraphBuilder, ModelSpec};
//!
//! let spec = ModelSpec::by_name("gpt-350M").unwrap();
//! let mesh = DeviceMesh::new(2, 2, "a100");
//! let plan = ExecutionPlan::uniform(1, 2, 2, mesh, spec.num_layers, 64).unwrap();
//! let graph = GraphBuilder::build(&plan, &spec).unwrap();
//! assert!(graph.num_nodes() > 0);
//! ```

mod builder;
mod error;
mod graph;
mod mesh;
mod plan;
mod spec;

pub use builder::GraphBuilder;
pub use error::PlanError;
pub use graph::{CollectiveKind, NodeKind, PlanEdge, PlanGraph, PlanNode};
pub use mesh::DeviceMesh;
pub use plan::{pipeline_span, ExecutionPlan, StageAssignment};
pub use spec::{ModelFamily, ModelSpec, OpKind, OperatorDef};
