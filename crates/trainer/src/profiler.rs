// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Ground-truth latency measurement.
//!
//! The external DL training compiler is opaque to this system: it is
//! modelled as the [`Profiler`] trait, a fallible `plan → latency`
//! function. Two implementations ship here:
//!
//! - [`SyntheticProfiler`] — a deterministic analytic cost model with
//!   optional seeded noise. Used for demos, tests, and data generation
//!   when no real cluster is attached.
//! - [`CachedProfiler`] — replays a recorded measurement set from a
//!   JSON file keyed by [`ExecutionPlan::cache_key`].
//!
//! Real measurements are long-running and flaky, so every call goes
//! through [`measure_with_retry`]: a timeout plus a bounded retry budget
//! for transient failures. Permanent failures (plan rejected, out of
//! memory) are never retried.

use plan_ir::{pipeline_span, ExecutionPlan, GraphBuilder, ModelSpec, NodeKind};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Why a single measurement failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeasureFailure {
    /// The compiler refused the plan (structural or unsupported).
    #[error("plan rejected: {0}")]
    Rejected(String),

    /// The measured execution raised an error.
    #[error("execution failed: {0}")]
    Execution(String),

    /// The measurement did not finish within the timeout.
    #[error("measurement timed out after {0:?}")]
    Timeout(Duration),

    /// The plan does not fit the per-device memory budget.
    #[error("plan exceeds memory budget: needs {needed_gb:.1} GB, limit {limit_gb:.1} GB")]
    OutOfMemory { needed_gb: f64, limit_gb: f64 },
}

impl MeasureFailure {
    /// Transient failures are worth retrying; permanent ones are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Execution(_) | Self::Timeout(_))
    }
}

/// An opaque source of ground-truth plan latencies.
///
/// Measurement calls must be idempotent: the retry wrapper may issue
/// the same plan several times.
pub trait Profiler: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Measures (or replays) the latency of one plan.
    fn measure(&self, plan: &ExecutionPlan) -> Result<Duration, MeasureFailure>;
}

/// Retry policy for measurement calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts per plan (including the first).
    pub attempts: usize,
    /// Timeout applied to each attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Runs one measurement under the retry policy.
///
/// Each attempt executes on the blocking pool with a timeout. Transient
/// failures consume an attempt; permanent failures return immediately.
pub async fn measure_with_retry(
    profiler: Arc<dyn Profiler>,
    plan: ExecutionPlan,
    policy: RetryPolicy,
) -> Result<Duration, MeasureFailure> {
    let mut last = MeasureFailure::Execution("no attempt made".into());
    for attempt in 1..=policy.attempts.max(1) {
        let profiler = Arc::clone(&profiler);
        let plan = plan.clone();
        let outcome = tokio::time::timeout(
            policy.timeout,
            tokio::task::spawn_blocking(move || profiler.measure(&plan)),
        )
        .await;

        let failure = match outcome {
            Ok(Ok(Ok(latency))) => return Ok(latency),
            Ok(Ok(Err(failure))) => failure,
            Ok(Err(join)) => MeasureFailure::Execution(format!("measurement task panicked: {join}")),
            Err(_) => MeasureFailure::Timeout(policy.timeout),
        };

        if !failure.is_transient() {
            return Err(failure);
        }
        tracing::warn!("measurement attempt {attempt} failed: {failure}");
        last = failure;
    }
    Err(last)
}

// ── Synthetic profiler ─────────────────────────────────────────────

/// Analytic stand-in for the real compiler.
///
/// Latency is derived from the plan graph: per-stage compute time from
/// per-device flops at a fixed accelerator rate, per-stage communication
/// time from collective volumes at a fixed interconnect bandwidth, then
/// pipelined over micro-batches with [`pipeline_span`]. An optional
/// multiplicative noise term (seeded by the plan identity, so repeated
/// measurements of the same plan agree) mimics run-to-run variance.
#[derive(Debug, Clone)]
pub struct SyntheticProfiler {
    spec: ModelSpec,
    /// Per-device compute throughput in TFLOP/s.
    pub peak_tflops: f64,
    /// Interconnect bandwidth in GB/s.
    pub bandwidth_gbps: f64,
    /// Relative noise amplitude (0.0 disables noise).
    pub noise: f64,
    /// Noise seed.
    pub seed: u64,
    /// Per-device memory budget in GB; `None` disables the check.
    pub memory_limit_gb: Option<f64>,
}

impl SyntheticProfiler {
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            spec,
            peak_tflops: 150.0,
            bandwidth_gbps: 100.0,
            noise: 0.0,
            seed: 0,
            memory_limit_gb: None,
        }
    }

    pub fn with_noise(mut self, noise: f64, seed: u64) -> Self {
        self.noise = noise;
        self.seed = seed;
        self
    }

    pub fn with_memory_limit_gb(mut self, limit: f64) -> Self {
        self.memory_limit_gb = Some(limit);
        self
    }
}

impl Profiler for SyntheticProfiler {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn measure(&self, plan: &ExecutionPlan) -> Result<Duration, MeasureFailure> {
        let graph = GraphBuilder::build(plan, &self.spec)
            .map_err(|e| MeasureFailure::Rejected(e.to_string()))?;

        // Per-device memory: parameters plus one activation slice of the
        // heaviest stage.
        if let Some(limit) = self.memory_limit_gb {
            let heaviest = (0..graph.num_stages)
                .map(|s| {
                    graph
                        .nodes
                        .iter()
                        .filter(|n| n.stage == s && matches!(n.kind, NodeKind::Compute(_)))
                        .map(|n| n.bytes)
                        .sum::<u64>()
                })
                .max()
                .unwrap_or(0);
            let needed_gb = heaviest as f64 / 1e9;
            if needed_gb > limit {
                return Err(MeasureFailure::OutOfMemory {
                    needed_gb,
                    limit_gb: limit,
                });
            }
        }

        // Per-stage, per-micro-batch latency.
        let mb = plan.num_micro_batches as f64;
        let mut stage_lats = vec![0.0f64; graph.num_stages];
        for node in &graph.nodes {
            let compute = node.flops as f64 / (self.peak_tflops * 1e12);
            let comm = match node.kind {
                NodeKind::Collective(_) => node.bytes as f64 / (self.bandwidth_gbps * 1e9),
                _ => 0.0,
            };
            stage_lats[node.stage] += (compute + comm) / mb;
        }

        let mut latency = pipeline_span(&stage_lats, plan.num_micro_batches);

        if self.noise > 0.0 {
            // Deterministic per plan: the same plan always "measures"
            // the same value, which keeps cached corpora consistent.
            let mut hasher = DefaultHasher::new();
            plan.cache_key().hash(&mut hasher);
            self.seed.hash(&mut hasher);
            let unit = (hasher.finish() % 10_000) as f64 / 10_000.0; // [0, 1)
            latency *= 1.0 + self.noise * (2.0 * unit - 1.0);
        }

        Ok(Duration::from_secs_f64(latency.max(1e-6)))
    }
}

// ── Cached profiler ────────────────────────────────────────────────

/// Replays a recorded measurement set.
///
/// The backing file is a JSON object mapping plan cache keys to
/// latencies in seconds.
#[derive(Debug, Clone)]
pub struct CachedProfiler {
    measurements: HashMap<String, f64>,
}

impl CachedProfiler {
    /// Loads a measurement set from a JSON file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let measurements: HashMap<String, f64> = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self { measurements })
    }

    /// Builds a profiler from in-memory measurements.
    pub fn from_measurements(measurements: HashMap<String, f64>) -> Self {
        Self { measurements }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

impl Profiler for CachedProfiler {
    fn name(&self) -> &str {
        "cached"
    }

    fn measure(&self, plan: &ExecutionPlan) -> Result<Duration, MeasureFailure> {
        let key = plan.cache_key();
        self.measurements
            .get(&key)
            .map(|&secs| Duration::from_secs_f64(secs))
            .ok_or_else(|| MeasureFailure::Rejected(format!("no cached measurement for '{key}'")))
    }
}
