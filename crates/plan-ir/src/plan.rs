// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution plans: candidate parallelisation choices for one model.
//!
//! An [`ExecutionPlan`] assigns each pipeline stage a contiguous layer
//! range and a (data-parallel, tensor-parallel) degree pair, on a given
//! [`DeviceMesh`](crate::DeviceMesh), with a micro-batch count. Plans
//! are immutable value objects compared by structural equality, which is
//! what the search loop and measurement caches key on.

use crate::{DeviceMesh, ModelSpec, PlanError};

/// Assignment of one pipeline stage: a layer range plus parallel degrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StageAssignment {
    /// First layer of the stage (inclusive).
    pub layer_start: usize,
    /// One past the last layer of the stage (exclusive).
    pub layer_end: usize,
    /// Data-parallel degree of this stage.
    pub data_parallel: usize,
    /// Tensor-parallel degree of this stage.
    pub tensor_parallel: usize,
}

impl StageAssignment {
    /// Number of layers in this stage.
    pub fn num_layers(&self) -> usize {
        self.layer_end.saturating_sub(self.layer_start)
    }

    /// Devices consumed by this stage.
    pub fn num_devices(&self) -> usize {
        self.data_parallel * self.tensor_parallel
    }
}

/// A candidate parallel execution plan.
///
/// The pipeline-parallel degree is implicit: it is the number of stages.
/// Plans are pure values; building the corresponding [`PlanGraph`]
/// (via [`GraphBuilder`](crate::GraphBuilder)) never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ExecutionPlan {
    /// Ordered stage assignments. Stage `i` feeds stage `i + 1`.
    pub stages: Vec<StageAssignment>,
    /// The device mesh the plan runs on.
    pub mesh: DeviceMesh,
    /// Number of micro-batches per training iteration.
    pub num_micro_batches: usize,
}

impl ExecutionPlan {
    /// Builds a uniform plan: `pp` equal stages, each with the same
    /// `(dp, tp)` degrees, covering `num_layers` layers.
    ///
    /// Fails if `pp` does not evenly divide the layer count; degree and
    /// mesh feasibility is checked later by [`validate`](Self::validate).
    pub fn uniform(
        dp: usize,
        tp: usize,
        pp: usize,
        mesh: DeviceMesh,
        num_layers: usize,
        num_micro_batches: usize,
    ) -> Result<Self, PlanError> {
        if pp == 0 {
            return Err(PlanError::EmptyPlan);
        }
        if num_layers % pp != 0 {
            return Err(PlanError::LayerCoverage {
                model: format!("{num_layers}-layer model"),
                detail: format!("pipeline degree {pp} does not divide {num_layers} layers"),
            });
        }
        let per_stage = num_layers / pp;
        let stages = (0..pp)
            .map(|i| StageAssignment {
                layer_start: i * per_stage,
                layer_end: (i + 1) * per_stage,
                data_parallel: dp,
                tensor_parallel: tp,
            })
            .collect();
        Ok(Self {
            stages,
            mesh,
            num_micro_batches,
        })
    }

    /// Pipeline-parallel degree (the number of stages).
    pub fn pipeline_degree(&self) -> usize {
        self.stages.len()
    }

    /// Validates the plan against a model spec and its own mesh.
    ///
    /// # Checks
    /// - At least one stage; at least one micro-batch.
    /// - Stage layer ranges are non-empty, contiguous, and cover exactly
    ///   `spec.num_layers` layers starting from 0.
    /// - Every degree is ≥ 1.
    /// - Tensor-parallel degrees divide `mesh.devices_per_host` (the
    ///   tensor-parallel group must fit inside one host).
    /// - Total devices consumed across stages equals the mesh size.
    ///
    /// Violations fail with the corresponding [`PlanError`]; nothing is
    /// clamped or repaired.
    pub fn validate(&self, spec: &ModelSpec) -> Result<(), PlanError> {
        if self.stages.is_empty() {
            return Err(PlanError::EmptyPlan);
        }
        if self.num_micro_batches == 0 {
            return Err(PlanError::MeshMismatch {
                detail: "micro-batch count must be at least 1".into(),
            });
        }

        let mut expected_start = 0;
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.layer_start != expected_start || stage.layer_end <= stage.layer_start {
                return Err(PlanError::LayerCoverage {
                    model: spec.name.clone(),
                    detail: format!(
                        "stage {i} covers layers {}..{}, expected a non-empty range starting at {expected_start}",
                        stage.layer_start, stage.layer_end,
                    ),
                });
            }
            expected_start = stage.layer_end;

            if stage.data_parallel == 0 || stage.tensor_parallel == 0 {
                return Err(PlanError::InvalidDegree {
                    stage: i,
                    detail: format!(
                        "degrees must be ≥ 1, got dp={} tp={}",
                        stage.data_parallel, stage.tensor_parallel,
                    ),
                });
            }
            if self.mesh.devices_per_host % stage.tensor_parallel != 0 {
                return Err(PlanError::InvalidDegree {
                    stage: i,
                    detail: format!(
                        "tensor-parallel degree {} does not divide {} devices per host",
                        stage.tensor_parallel, self.mesh.devices_per_host,
                    ),
                });
            }
        }

        if expected_start != spec.num_layers {
            return Err(PlanError::LayerCoverage {
                model: spec.name.clone(),
                detail: format!(
                    "stages cover {expected_start} layers but the model has {}",
                    spec.num_layers,
                ),
            });
        }

        let devices_used: usize = self.stages.iter().map(|s| s.num_devices()).sum();
        if devices_used != self.mesh.total_devices() {
            return Err(PlanError::MeshMismatch {
                detail: format!(
                    "stages consume {devices_used} devices but the mesh has {}",
                    self.mesh.total_devices(),
                ),
            });
        }

        Ok(())
    }

    /// Stable identity string for caches and measurement records.
    ///
    /// Structurally equal plans always produce the same key.
    pub fn cache_key(&self) -> String {
        let stages: Vec<String> = self
            .stages
            .iter()
            .map(|s| {
                format!(
                    "l{}-{}dp{}tp{}",
                    s.layer_start, s.layer_end, s.data_parallel, s.tensor_parallel
                )
            })
            .collect();
        format!(
            "{}@{}mb{}",
            stages.join("_"),
            self.mesh.signature(),
            self.num_micro_batches
        )
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let degrees: Vec<String> = self
            .stages
            .iter()
            .map(|s| format!("dp{}×tp{}", s.data_parallel, s.tensor_parallel))
            .collect();
        format!(
            "Plan: {} stages [{}], {} micro-batches on {}",
            self.stages.len(),
            degrees.join(", "),
            self.num_micro_batches,
            self.mesh.signature(),
        )
    }
}

/// Make-span of a pipelined iteration: the slowest stage is paid once
/// per extra micro-batch, every stage once for the first.
///
/// `span = max(stages) · (m − 1) + sum(stages)`
pub fn pipeline_span(stage_latencies: &[f64], num_micro_batches: usize) -> f64 {
    if stage_latencies.is_empty() || num_micro_batches == 0 {
        return 0.0;
    }
    let max = stage_latencies.iter().copied().fold(0.0f64, f64::max);
    let sum: f64 = stage_latencies.iter().sum();
    max * (num_micro_batches as f64 - 1.0) + sum
}
