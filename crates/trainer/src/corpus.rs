// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The training corpus and collection bookkeeping.

use cost_model::TrainingExample;
use std::time::Duration;

/// A plan that was excluded from the corpus, with the reason why.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedPlan {
    /// The plan's cache key.
    pub plan: String,
    /// Why it was excluded.
    pub reason: String,
    /// How many measurement attempts were made (0 for build/encode skips).
    pub attempts: usize,
}

/// Outcome of one collection pass.
///
/// Skips are surfaced as data, never silently dropped: callers log the
/// count and can inspect each excluded plan.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionReport {
    /// Examples added to the corpus by this pass.
    pub collected: usize,
    /// Plans excluded by this pass.
    pub skipped: Vec<SkippedPlan>,
    /// Wall-clock time of the pass.
    pub wall: Duration,
}

impl CollectionReport {
    /// Returns a human-readable summary of the pass.
    pub fn summary(&self) -> String {
        format!(
            "Collection: {} examples in {:.1}s, {} skipped",
            self.collected,
            self.wall.as_secs_f64(),
            self.skipped.len(),
        )
    }
}

/// An append-only set of training examples.
///
/// The corpus accumulates across collection passes; it only shrinks
/// through an explicit [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    examples: Vec<TrainingExample>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, example: TrainingExample) {
        self.examples.push(example);
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn as_slice(&self) -> &[TrainingExample] {
        &self.examples
    }

    /// Drops all accumulated examples.
    pub fn reset(&mut self) {
        self.examples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_encode::{EncodedGraph, FEATURE_SCHEMA_VERSION, FEATURE_WIDTH};

    fn example(latency: f64) -> TrainingExample {
        TrainingExample {
            encoded: EncodedGraph {
                num_nodes: 1,
                feature_width: FEATURE_WIDTH,
                schema_version: FEATURE_SCHEMA_VERSION,
                features: vec![0.0; FEATURE_WIDTH],
                bias: vec![0.0],
                depths: vec![0],
            },
            latency_secs: latency,
        }
    }

    #[test]
    fn test_corpus_accumulates() {
        let mut corpus = Corpus::new();
        corpus.push(example(1.0));
        corpus.push(example(2.0));
        assert_eq!(corpus.len(), 2);
        corpus.push(example(3.0));
        assert_eq!(corpus.len(), 3);
        corpus.reset();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_report_summary() {
        let report = CollectionReport {
            collected: 5,
            skipped: vec![SkippedPlan {
                plan: "p".into(),
                reason: "timeout".into(),
                attempts: 3,
            }],
            wall: Duration::from_secs(2),
        };
        let s = report.summary();
        assert!(s.contains("5 examples"));
        assert!(s.contains("1 skipped"));
    }
}
