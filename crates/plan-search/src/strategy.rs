// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Search strategies: which candidates actually get evaluated.
//!
//! [`Exhaustive`] scores every feasible candidate. [`SeededSample`]
//! caps the evaluation count for very large spaces with a reproducible,
//! seeded subset — a truncated search reports `budget_limited` on its
//! outcome rather than pretending it was exhaustive.

use plan_ir::ExecutionPlan;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Chooses the subset of candidates to evaluate.
///
/// Strategies are purely algorithmic — no I/O — and must be
/// deterministic for fixed inputs so that re-running a search
/// reproduces its ranking.
pub trait SearchStrategy: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Returns the candidates to evaluate and whether the space was
    /// truncated by an evaluation budget.
    fn select(&self, candidates: Vec<ExecutionPlan>) -> (Vec<ExecutionPlan>, bool);
}

/// Evaluates every feasible candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl SearchStrategy for Exhaustive {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn select(&self, candidates: Vec<ExecutionPlan>) -> (Vec<ExecutionPlan>, bool) {
        (candidates, false)
    }
}

/// Evaluates a seeded random subset of at most `budget` candidates.
///
/// Sampling is without replacement and keeps the space's enumeration
/// order, so a given `(space, budget, seed)` triple always evaluates
/// the same candidates in the same order.
#[derive(Debug, Clone, Copy)]
pub struct SeededSample {
    /// Maximum number of candidates to evaluate.
    pub budget: usize,
    /// Sampling seed.
    pub seed: u64,
}

impl SearchStrategy for SeededSample {
    fn name(&self) -> &str {
        "seeded-sample"
    }

    fn select(&self, candidates: Vec<ExecutionPlan>) -> (Vec<ExecutionPlan>, bool) {
        if candidates.len() <= self.budget {
            return (candidates, false);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut picked: Vec<usize> =
            rand::seq::index::sample(&mut rng, candidates.len(), self.budget).into_vec();
        picked.sort_unstable();

        let mut keep = vec![false; candidates.len()];
        for i in picked {
            keep[i] = true;
        }
        let selected = candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(plan, kept)| kept.then_some(plan))
            .collect();
        (selected, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_ir::DeviceMesh;

    fn plans(n: usize) -> Vec<ExecutionPlan> {
        let mesh = DeviceMesh::new(1, 4, "a100");
        (1..=n)
            .map(|mb| ExecutionPlan::uniform(4, 1, 1, mesh.clone(), 24, mb).unwrap())
            .collect()
    }

    #[test]
    fn test_exhaustive_keeps_everything() {
        let (selected, limited) = Exhaustive.select(plans(7));
        assert_eq!(selected.len(), 7);
        assert!(!limited);
    }

    #[test]
    fn test_sample_within_budget_is_not_limited() {
        let strategy = SeededSample { budget: 10, seed: 1 };
        let (selected, limited) = strategy.select(plans(7));
        assert_eq!(selected.len(), 7);
        assert!(!limited);
    }

    #[test]
    fn test_sample_truncates_and_reports_it() {
        let strategy = SeededSample { budget: 3, seed: 1 };
        let (selected, limited) = strategy.select(plans(10));
        assert_eq!(selected.len(), 3);
        assert!(limited);
    }

    #[test]
    fn test_sample_is_reproducible() {
        let strategy = SeededSample { budget: 4, seed: 9 };
        let (a, _) = strategy.select(plans(12));
        let (b, _) = strategy.select(plans(12));
        assert_eq!(a, b);

        let other = SeededSample { budget: 4, seed: 10 };
        let (c, _) = other.select(plans(12));
        assert_ne!(a, c, "different seeds should pick different subsets");
    }

    #[test]
    fn test_sample_preserves_enumeration_order() {
        let all = plans(12);
        let strategy = SeededSample { budget: 5, seed: 3 };
        let (selected, _) = strategy.select(all.clone());

        let positions: Vec<usize> = selected
            .iter()
            .map(|p| all.iter().position(|q| q == p).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
