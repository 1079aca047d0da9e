// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The search loop: score candidates, rank, pick the arg-min.
//!
//! Candidates are built, encoded, and scored concurrently (rayon) over
//! a read-only estimator; a candidate whose build or encode fails is
//! skipped and counted, never fatal. The ranking sorts ascending by
//! predicted latency with ties broken by smaller total communication
//! volume — a structural tiebreaker, so the predictor's noise does not
//! decide ties — and finally by plan identity, which makes the order
//! total and the search idempotent.

use crate::{LatencyEstimator, SearchError, SearchSpace, SearchStrategy};
use cost_model::CancelToken;
use graph_encode::GraphEncoder;
use plan_ir::{ExecutionPlan, GraphBuilder, ModelSpec};
use rayon::prelude::*;

/// One scored candidate.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RankedPlan {
    /// The candidate plan.
    pub plan: ExecutionPlan,
    /// Predicted latency in seconds.
    pub predicted_latency: f64,
    /// Total collective communication volume (the tiebreaker).
    pub comm_volume_bytes: u64,
}

/// Result of one search run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchOutcome {
    /// All scored candidates, best first.
    pub ranked: Vec<RankedPlan>,
    /// Candidates actually scored.
    pub evaluated: usize,
    /// Candidates skipped (build or encode failure, or cancellation).
    pub skipped: usize,
    /// True if an evaluation budget truncated the space.
    pub budget_limited: bool,
    /// True if the run was cancelled before finishing.
    pub cancelled: bool,
}

impl SearchOutcome {
    /// The minimum-predicted-latency plan.
    pub fn best(&self) -> &RankedPlan {
        // `search` never returns an outcome with an empty ranking.
        &self.ranked[0]
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let best = self.best();
        format!(
            "Search: best {} at {:.4}s predicted, {} candidates evaluated, {} skipped{}{}",
            best.plan.summary(),
            best.predicted_latency,
            self.evaluated,
            self.skipped,
            if self.budget_limited {
                " (budget-limited, best found so far)"
            } else {
                ""
            },
            if self.cancelled { " (cancelled)" } else { "" },
        )
    }
}

/// Searches a plan space with a latency estimator.
pub struct Searcher {
    spec: ModelSpec,
    encoder: GraphEncoder,
    cancel: CancelToken,
}

impl Searcher {
    /// Creates a searcher for one benchmark model.
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            spec,
            encoder: GraphEncoder::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Overrides the graph encoder.
    pub fn with_encoder(mut self, encoder: GraphEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Uses an external cancellation token instead of a private one.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the search: enumerate → select → score → rank.
    ///
    /// # Errors
    /// - [`SearchError::EmptySpace`] if the space has no candidates.
    /// - [`SearchError::NoFeasiblePlan`] if every candidate was skipped.
    /// - [`SearchError::Model`] if the estimator rejects an encoding
    ///   (schema mismatch is fatal for the whole run).
    pub fn search(
        &self,
        space: &SearchSpace,
        strategy: &dyn SearchStrategy,
        estimator: &dyn LatencyEstimator,
    ) -> Result<SearchOutcome, SearchError> {
        let candidates = space.candidates();
        if candidates.is_empty() {
            return Err(SearchError::EmptySpace);
        }

        let (selected, budget_limited) = strategy.select(candidates);
        tracing::info!(
            "scoring {} candidates via '{}' strategy{}",
            selected.len(),
            strategy.name(),
            if budget_limited { " (budget-limited)" } else { "" },
        );

        let scored: Vec<Option<RankedPlan>> = selected
            .par_iter()
            .map(|plan| self.score(plan, estimator))
            .collect::<Result<_, _>>()?;

        let total = selected.len();
        let mut ranked: Vec<RankedPlan> = scored.into_iter().flatten().collect();
        let evaluated = ranked.len();
        if ranked.is_empty() {
            return Err(SearchError::NoFeasiblePlan { candidates: total });
        }

        ranked.sort_by(|a, b| {
            a.predicted_latency
                .total_cmp(&b.predicted_latency)
                .then(a.comm_volume_bytes.cmp(&b.comm_volume_bytes))
                .then_with(|| a.plan.cache_key().cmp(&b.plan.cache_key()))
        });

        let outcome = SearchOutcome {
            ranked,
            evaluated,
            skipped: total - evaluated,
            budget_limited,
            cancelled: self.cancel.is_cancelled(),
        };
        tracing::info!("{}", outcome.summary());
        Ok(outcome)
    }

    /// Predicts latencies for caller-authored plans, in input order.
    ///
    /// Unlike [`search`](Self::search), nothing is skipped here: an
    /// infeasible plan surfaces its [`SearchError::Plan`] directly.
    pub fn predict_plans(
        &self,
        plans: &[ExecutionPlan],
        estimator: &dyn LatencyEstimator,
    ) -> Result<Vec<f64>, SearchError> {
        plans
            .iter()
            .map(|plan| {
                let graph = GraphBuilder::build(plan, &self.spec)?;
                let encoded = self.encoder.encode(&graph)?;
                Ok(estimator.estimate(plan, &encoded)?)
            })
            .collect()
    }

    /// Scores one candidate; `Ok(None)` means skipped.
    fn score(
        &self,
        plan: &ExecutionPlan,
        estimator: &dyn LatencyEstimator,
    ) -> Result<Option<RankedPlan>, SearchError> {
        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        let graph = match GraphBuilder::build(plan, &self.spec) {
            Ok(graph) => graph,
            Err(e) => {
                tracing::debug!("skipping candidate {}: {e}", plan.cache_key());
                return Ok(None);
            }
        };
        let encoded = match self.encoder.encode(&graph) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::debug!("skipping candidate {}: {e}", plan.cache_key());
                return Ok(None);
            }
        };
        let predicted_latency = estimator.estimate(plan, &encoded)?;
        Ok(Some(RankedPlan {
            plan: plan.clone(),
            predicted_latency,
            comm_volume_bytes: graph.total_comm_volume(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Exhaustive, SeededSample};
    use cost_model::ModelError;
    use graph_encode::{EncodedGraph, EncoderConfig};
    use plan_ir::DeviceMesh;
    use std::collections::HashMap;

    fn spec() -> ModelSpec {
        ModelSpec::by_name("gpt-350M").unwrap()
    }

    fn mesh() -> DeviceMesh {
        DeviceMesh::new(2, 2, "a100")
    }

    fn space() -> SearchSpace {
        SearchSpace::new(spec(), mesh()).with_micro_batches(vec![16, 32])
    }

    /// Stub estimator: latencies assigned per plan cache key.
    struct Stub(HashMap<String, f64>);

    impl Stub {
        fn for_candidates(latencies: &[f64], candidates: &[ExecutionPlan]) -> Self {
            assert!(candidates.len() >= latencies.len());
            Self(
                candidates
                    .iter()
                    .zip(latencies)
                    .map(|(p, &l)| (p.cache_key(), l))
                    .collect(),
            )
        }
    }

    impl LatencyEstimator for Stub {
        fn estimate(&self, plan: &ExecutionPlan, _: &EncodedGraph) -> Result<f64, ModelError> {
            Ok(*self.0.get(&plan.cache_key()).unwrap_or(&999.0))
        }
    }

    #[test]
    fn test_scenario_eight_plans_argmin_and_tiebreak() {
        let space = space();
        let candidates = space.candidates();
        assert!(candidates.len() >= 8, "need 8 plans, got {}", candidates.len());
        // The first 8 enumerated candidates get the scripted latencies;
        // any remaining candidate gets the stub's sentinel (999), far
        // above all of them.
        let eight = &candidates[..8];

        let latencies = [5.0, 3.0, 9.0, 3.0, 7.0, 2.0, 8.0, 4.0];
        let stub = Stub::for_candidates(&latencies, eight);

        let outcome = Searcher::new(spec())
            .search(&space, &Exhaustive, &stub)
            .unwrap();

        // Arg-min is the plan that was assigned latency 2.
        assert_eq!(outcome.best().predicted_latency, 2.0);
        assert_eq!(outcome.best().plan, eight[5]);

        // Ranking is ascending.
        for pair in outcome.ranked.windows(2) {
            assert!(pair[0].predicted_latency <= pair[1].predicted_latency);
        }

        // The two latency-3 plans are ordered by communication volume.
        let threes: Vec<&RankedPlan> = outcome
            .ranked
            .iter()
            .filter(|r| r.predicted_latency == 3.0)
            .collect();
        assert_eq!(threes.len(), 2);
        assert!(threes[0].comm_volume_bytes <= threes[1].comm_volume_bytes);
        assert!(!outcome.budget_limited);
    }

    #[test]
    fn test_search_is_idempotent() {
        let space = space();
        let candidates = space.candidates();
        let latencies: Vec<f64> = (0..candidates.len()).map(|i| (i * 7 % 13) as f64).collect();
        let stub = Stub::for_candidates(&latencies, &candidates);

        let searcher = Searcher::new(spec());
        let a = searcher.search(&space, &Exhaustive, &stub).unwrap();
        let b = searcher.search(&space, &Exhaustive, &stub).unwrap();

        assert_eq!(a.best().plan, b.best().plan);
        let keys = |o: &SearchOutcome| -> Vec<String> {
            o.ranked.iter().map(|r| r.plan.cache_key()).collect()
        };
        assert_eq!(keys(&a), keys(&b));
    }

    #[test]
    fn test_budget_limited_reported() {
        let space = space();
        let candidates = space.candidates();
        let stub = Stub::for_candidates(
            &vec![1.0; candidates.len()],
            &candidates,
        );

        let strategy = SeededSample { budget: 3, seed: 7 };
        let outcome = Searcher::new(spec())
            .search(&space, &strategy, &stub)
            .unwrap();
        assert!(outcome.budget_limited);
        assert_eq!(outcome.evaluated, 3);
        assert!(outcome.summary().contains("budget-limited"));
    }

    #[test]
    fn test_oversized_graphs_skipped_not_fatal() {
        let space = space();
        let candidates = space.candidates();
        let stub = Stub::for_candidates(&vec![1.0; candidates.len()], &candidates);

        // A 60-node limit passes the collective-free plans (~50 nodes)
        // and rejects the tensor-parallel ones (~100 nodes).
        let searcher =
            Searcher::new(spec()).with_encoder(GraphEncoder::new(EncoderConfig { max_nodes: 60 }));
        let outcome = searcher.search(&space, &Exhaustive, &stub);

        match outcome {
            Ok(o) => assert!(o.skipped > 0),
            Err(SearchError::NoFeasiblePlan { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        struct Mismatch;
        impl LatencyEstimator for Mismatch {
            fn estimate(
                &self,
                _: &ExecutionPlan,
                encoded: &EncodedGraph,
            ) -> Result<f64, ModelError> {
                Err(ModelError::SchemaMismatch {
                    expected_version: 1,
                    expected_width: 8,
                    actual_version: encoded.schema_version,
                    actual_width: encoded.feature_width,
                })
            }
        }

        let result = Searcher::new(spec()).search(&space(), &Exhaustive, &Mismatch);
        assert!(matches!(result, Err(SearchError::Model(_))));
    }

    #[test]
    fn test_empty_space() {
        // No micro-batch options → no candidates.
        let empty = SearchSpace::new(spec(), mesh()).with_micro_batches(vec![]);
        assert_eq!(empty.size(), 0);

        let stub = Stub(HashMap::new());
        assert!(matches!(
            Searcher::new(spec()).search(&empty, &Exhaustive, &stub),
            Err(SearchError::EmptySpace)
        ));
    }

    #[test]
    fn test_cancelled_search() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let space = space();
        let candidates = space.candidates();
        let stub = Stub::for_candidates(&vec![1.0; candidates.len()], &candidates);

        let searcher = Searcher::new(spec()).with_cancel(cancel);
        assert!(matches!(
            searcher.search(&space, &Exhaustive, &stub),
            Err(SearchError::NoFeasiblePlan { .. })
        ));
    }

    #[test]
    fn test_predict_plans_in_order() {
        let p1 = ExecutionPlan::uniform(4, 1, 1, mesh(), 24, 16).unwrap();
        let p2 = ExecutionPlan::uniform(1, 2, 2, mesh(), 24, 16).unwrap();
        let mut map = HashMap::new();
        map.insert(p1.cache_key(), 1.5);
        map.insert(p2.cache_key(), 0.25);
        let stub = Stub(map);

        let latencies = Searcher::new(spec())
            .predict_plans(&[p1, p2], &stub)
            .unwrap();
        assert_eq!(latencies, vec![1.5, 0.25]);
    }

    #[test]
    fn test_predict_plans_surfaces_invalid_plan() {
        // tp=4 does not divide 2 devices per host.
        let bad = ExecutionPlan::uniform(1, 4, 1, mesh(), 24, 16).unwrap();
        let stub = Stub(HashMap::new());
        assert!(matches!(
            Searcher::new(spec()).predict_plans(&[bad], &stub),
            Err(SearchError::Plan(_))
        ));
    }
}
