// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Training-run metrics.
//!
//! [`TrainingMetrics`] aggregates collection and fitting statistics for
//! one pipeline run. Skipped plans are reported as counts here and as
//! per-plan records in the collection report, never silently dropped.

use crate::CollectionReport;
use cost_model::TrainReport;
use std::time::Duration;

/// Aggregate metrics for a complete training run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TrainingMetrics {
    /// Examples added to the corpus across all collection passes.
    pub examples_collected: usize,
    /// Plans excluded (build/encode failure or measurement failure).
    pub plans_skipped: usize,
    /// Plans left out by the seeded corpus subsample.
    pub plans_sampled_out: usize,
    /// Wall-clock time spent measuring plans.
    pub collection_duration: Duration,
    /// Epochs the optimiser actually ran.
    pub epochs_run: usize,
    /// Mean-squared error on normalized targets after the last epoch.
    pub final_loss: f32,
    /// True if the run stopped early due to cancellation.
    pub cancelled: bool,
    /// Total wall-clock time of the run.
    pub total_duration: Duration,
}

impl TrainingMetrics {
    /// Creates an empty metrics container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one collection pass into the totals.
    pub fn record_collection(&mut self, report: &CollectionReport, sampled_out: usize) {
        self.examples_collected += report.collected;
        self.plans_skipped += report.skipped.len();
        self.plans_sampled_out += sampled_out;
        self.collection_duration += report.wall;
    }

    /// Records the outcome of the fit step.
    pub fn record_fit(&mut self, report: &TrainReport) {
        self.epochs_run = report.epochs_run;
        self.final_loss = report.final_loss;
        self.cancelled = report.cancelled;
    }

    /// Finalises with the total wall-clock time of the run.
    pub fn finalise(&mut self, total: Duration) {
        self.total_duration = total;
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Training: {} examples ({} skipped, {} sampled out), \
             {} epochs, final loss {:.4}, {:.1}s collection, {:.1}s total{}",
            self.examples_collected,
            self.plans_skipped,
            self.plans_sampled_out,
            self.epochs_run,
            self.final_loss,
            self.collection_duration.as_secs_f64(),
            self.total_duration.as_secs_f64(),
            if self.cancelled { " (cancelled)" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkippedPlan;

    #[test]
    fn test_record_collection_accumulates() {
        let mut m = TrainingMetrics::new();
        let report = CollectionReport {
            collected: 4,
            skipped: vec![SkippedPlan {
                plan: "p".into(),
                reason: "timeout".into(),
                attempts: 3,
            }],
            wall: Duration::from_secs(1),
        };
        m.record_collection(&report, 2);
        m.record_collection(&report, 0);
        assert_eq!(m.examples_collected, 8);
        assert_eq!(m.plans_skipped, 2);
        assert_eq!(m.plans_sampled_out, 2);
        assert_eq!(m.collection_duration, Duration::from_secs(2));
    }

    #[test]
    fn test_summary_format() {
        let mut m = TrainingMetrics::new();
        m.record_fit(&TrainReport {
            epochs_run: 120,
            final_loss: 0.0321,
            examples: 10,
            cancelled: false,
        });
        m.finalise(Duration::from_secs(5));
        let s = m.summary();
        assert!(s.contains("120 epochs"));
        assert!(s.contains("0.0321"));
        assert!(!s.contains("cancelled"));
    }

    #[test]
    fn test_summary_marks_cancelled() {
        let mut m = TrainingMetrics::new();
        m.record_fit(&TrainReport {
            epochs_run: 10,
            final_loss: 0.5,
            examples: 10,
            cancelled: true,
        });
        assert!(m.summary().contains("(cancelled)"));
    }
}
