// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Search-space enumeration.
//!
//! A [`SearchSpace`] generates every candidate plan for one
//! `(model, mesh)` pair: all `(dp, tp, pp)` factorisations of the
//! cluster size crossed with the configured micro-batch options,
//! pre-pruned by the plan feasibility invariants so infeasible
//! combinations never reach the predictor.

use plan_ir::{DeviceMesh, ExecutionPlan, ModelSpec};

/// The candidate space for one model on one mesh.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    spec: ModelSpec,
    mesh: DeviceMesh,
    micro_batch_options: Vec<usize>,
}

impl SearchSpace {
    /// Creates a space with the default micro-batch options.
    pub fn new(spec: ModelSpec, mesh: DeviceMesh) -> Self {
        Self {
            spec,
            mesh,
            micro_batch_options: vec![16, 32, 64],
        }
    }

    /// Overrides the micro-batch options.
    pub fn with_micro_batches(mut self, options: Vec<usize>) -> Self {
        self.micro_batch_options = options;
        self
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn mesh(&self) -> &DeviceMesh {
        &self.mesh
    }

    /// Enumerates all feasible candidates in a fixed order:
    /// micro-batch–major, then data-parallel, then tensor-parallel
    /// degree ascending. The order is what makes seeded sampling and
    /// ranking reproducible run-to-run.
    pub fn candidates(&self) -> Vec<ExecutionPlan> {
        let total = self.mesh.total_devices();
        let mut out = Vec::new();

        for &mb in &self.micro_batch_options {
            for dp in divisors(total) {
                for tp in divisors(total / dp) {
                    let pp = total / dp / tp;
                    let plan = match ExecutionPlan::uniform(
                        dp,
                        tp,
                        pp,
                        self.mesh.clone(),
                        self.spec.num_layers,
                        mb,
                    ) {
                        Ok(plan) => plan,
                        // pp does not divide the layer count.
                        Err(_) => continue,
                    };
                    if plan.validate(&self.spec).is_ok() {
                        out.push(plan);
                    }
                }
            }
        }

        tracing::debug!(
            "search space for '{}' on {}: {} candidates",
            self.spec.name,
            self.mesh.signature(),
            out.len(),
        );
        out
    }

    /// Number of feasible candidates.
    pub fn size(&self) -> usize {
        self.candidates().len()
    }
}

/// Divisors of `n` in ascending order.
fn divisors(n: usize) -> Vec<usize> {
    (1..=n).filter(|d| n % d == 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> SearchSpace {
        let spec = ModelSpec::by_name("gpt-350M").unwrap();
        let mesh = DeviceMesh::new(2, 2, "a100");
        SearchSpace::new(spec, mesh).with_micro_batches(vec![16])
    }

    #[test]
    fn test_enumeration_is_feasible_and_deterministic() {
        let s = space();
        let a = s.candidates();
        let b = s.candidates();
        assert_eq!(a, b);
        assert!(!a.is_empty());

        let spec = s.spec().clone();
        for plan in &a {
            plan.validate(&spec).unwrap();
        }
    }

    #[test]
    fn test_infeasible_degrees_pruned() {
        // tp=4 cannot fit inside a 2-devices-per-host host group.
        let candidates = space().candidates();
        assert!(candidates.iter().all(|p| p.stages[0].tensor_parallel <= 2));
        // dp·tp·pp always equals the mesh size.
        assert!(candidates
            .iter()
            .all(|p| p.stages.iter().map(|s| s.num_devices()).sum::<usize>() == 4));
    }

    #[test]
    fn test_micro_batches_multiply_the_space() {
        let one = space().with_micro_batches(vec![16]).size();
        let two = space().with_micro_batches(vec![16, 32]).size();
        assert_eq!(two, one * 2);
    }

    #[test]
    fn test_single_device_space() {
        let spec = ModelSpec::by_name("gpt-350M").unwrap();
        let mesh = DeviceMesh::new(1, 1, "a100");
        let candidates = SearchSpace::new(spec, mesh)
            .with_micro_batches(vec![8])
            .candidates();
        // Only dp=tp=pp=1.
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].pipeline_degree(), 1);
    }

    #[test]
    fn test_divisors() {
        assert_eq!(divisors(1), vec![1]);
        assert_eq!(divisors(12), vec![1, 2, 3, 4, 6, 12]);
    }
}
