// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The training pipeline with type-state–enforced phases.
//!
//! ```text
//! TrainingPipeline<Collecting>
//!     │  .collect(plans, profiler)
//!     ▼
//! TrainingPipeline<Collected>     (collect_more() accumulates)
//!     │  .fit() / .fit_warm()
//!     ▼
//! TrainingPipeline<Trained>
//!     │  .into_predictor()
//!     ▼
//!   TrainedPredictor
//! ```
//!
//! Each transition consumes the old value and returns a new one, so
//! fitting before collecting is a compile error.
//!
//! [`train_or_load`] is the orchestration entry point: it reuses a
//! compatible stored artifact when the configuration asks for it, and
//! otherwise collects, fits, and persists under the key's advisory lock.
//! The artifact is only written at defined checkpoints — after `fit`
//! returns, and optionally at configured epoch boundaries — never
//! mid-step.

use crate::{
    measure_with_retry, CollectionReport, Corpus, Profiler, RetryPolicy, SkippedPlan, TrainError,
    TrainerConfig, TrainingMetrics,
};
use artifact_store::{ArtifactKey, ArtifactStore, StoreError};
use cost_model::{
    fit_from_with_hook, fit_with_hook, CancelToken, EpochHook, LatencyModel, ModelConfig,
    Provenance, TrainingExample,
};
use graph_encode::GraphEncoder;
use plan_ir::{ExecutionPlan, GraphBuilder, ModelSpec};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Instant;

// ── Type-state markers ─────────────────────────────────────────────

/// Pipeline is created but holds no examples yet.
#[derive(Debug)]
pub struct Collecting;

/// At least one collection pass has run.
#[derive(Debug)]
pub struct Collected;

/// A predictor has been fitted to the corpus.
#[derive(Debug)]
pub struct Trained;

/// Sealed trait for pipeline states.
pub trait PipelineState: std::fmt::Debug {}
impl PipelineState for Collecting {}
impl PipelineState for Collected {}
impl PipelineState for Trained {}

// ── Trained predictor ──────────────────────────────────────────────

/// A predictor ready for inference, with its provenance.
#[derive(Debug)]
pub struct TrainedPredictor {
    model: LatencyModel,
    provenance: Provenance,
    metrics: Option<TrainingMetrics>,
}

impl TrainedPredictor {
    /// Wraps a model restored from the artifact store.
    pub fn loaded(model: LatencyModel) -> Self {
        Self {
            model,
            provenance: Provenance::LoadedFromStore,
            metrics: None,
        }
    }

    /// The predictor itself. Read-only; share it across search workers.
    pub fn model(&self) -> &LatencyModel {
        &self.model
    }

    /// Whether the model was trained in this process or restored.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Run metrics, present only for freshly trained predictors.
    pub fn metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics.as_ref()
    }

    /// Unwraps the model.
    pub fn into_model(self) -> LatencyModel {
        self.model
    }
}

// ── Pipeline ───────────────────────────────────────────────────────

/// The training pipeline.
///
/// `S` is a type-state marker enforcing the collect → fit ordering at
/// compile time.
pub struct TrainingPipeline<S: PipelineState = Collecting> {
    spec: ModelSpec,
    config: TrainerConfig,
    model_config: ModelConfig,
    encoder: GraphEncoder,
    cancel: CancelToken,
    corpus: Corpus,
    reports: Vec<CollectionReport>,
    metrics: TrainingMetrics,
    started: Instant,
    model: Option<LatencyModel>,
    _state: std::marker::PhantomData<S>,
}

impl TrainingPipeline<Collecting> {
    /// Creates a pipeline for one benchmark model.
    pub fn new(spec: ModelSpec, config: TrainerConfig) -> Self {
        Self {
            spec,
            config,
            model_config: ModelConfig::default(),
            encoder: GraphEncoder::default(),
            cancel: CancelToken::new(),
            corpus: Corpus::new(),
            reports: Vec::new(),
            metrics: TrainingMetrics::new(),
            started: Instant::now(),
            model: None,
            _state: std::marker::PhantomData,
        }
    }

    /// Uses an external cancellation token instead of a private one.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Overrides the graph encoder.
    pub fn with_encoder(mut self, encoder: GraphEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Overrides the predictor dimensions.
    pub fn with_model_config(mut self, model_config: ModelConfig) -> Self {
        self.model_config = model_config;
        self
    }

    /// Runs the first collection pass over `plans`.
    /// Transitions to the `Collected` state.
    ///
    /// Plans that fail to build, encode, or measure are excluded and
    /// recorded in the pass's [`CollectionReport`]; a failing plan never
    /// aborts the pass. Cancellation stops issuing new measurements and
    /// keeps what was already collected.
    pub async fn collect(
        mut self,
        plans: &[ExecutionPlan],
        profiler: Arc<dyn Profiler>,
    ) -> TrainingPipeline<Collected> {
        self.collect_pass(plans, profiler).await;
        TrainingPipeline {
            spec: self.spec,
            config: self.config,
            model_config: self.model_config,
            encoder: self.encoder,
            cancel: self.cancel,
            corpus: self.corpus,
            reports: self.reports,
            metrics: self.metrics,
            started: self.started,
            model: None,
            _state: std::marker::PhantomData,
        }
    }
}

impl TrainingPipeline<Collected> {
    /// Number of examples accumulated so far.
    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    /// Reports of every collection pass, in order.
    pub fn reports(&self) -> &[CollectionReport] {
        &self.reports
    }

    /// Runs another collection pass; the corpus accumulates.
    pub async fn collect_more(
        mut self,
        plans: &[ExecutionPlan],
        profiler: Arc<dyn Profiler>,
    ) -> Self {
        self.collect_pass(plans, profiler).await;
        self
    }

    /// Drops all accumulated examples.
    pub fn reset_corpus(&mut self) {
        self.corpus.reset();
    }

    /// Fits a fresh predictor to the corpus.
    /// Transitions to the `Trained` state.
    ///
    /// # Errors
    /// - [`TrainError::NoExamplesCollected`] if every plan was skipped.
    /// - [`cost_model::ModelError::InsufficientData`] (wrapped) if the
    ///   corpus is below the configured minimum.
    /// - [`TrainError::Cancelled`] if cancellation fired before a single
    ///   epoch ran.
    pub fn fit(self) -> Result<TrainingPipeline<Trained>, TrainError> {
        self.fit_inner(None, None)
    }

    /// Continues training from `model` (warm start) instead of
    /// initialising fresh parameters.
    pub fn fit_warm(self, model: LatencyModel) -> Result<TrainingPipeline<Trained>, TrainError> {
        self.fit_inner(Some(model), None)
    }

    fn fit_inner(
        mut self,
        warm: Option<LatencyModel>,
        hook: Option<EpochHook<'_>>,
    ) -> Result<TrainingPipeline<Trained>, TrainError> {
        if self.corpus.is_empty() {
            return Err(TrainError::NoExamplesCollected {
                skipped: self.metrics.plans_skipped,
            });
        }

        let (model, report) = match warm {
            Some(model) => {
                tracing::info!("warm-starting from existing parameters");
                fit_from_with_hook(
                    model,
                    self.corpus.as_slice(),
                    &self.config.train,
                    &self.cancel,
                    hook,
                )?
            }
            None => fit_with_hook(
                self.corpus.as_slice(),
                self.model_config.clone(),
                &self.config.train,
                &self.cancel,
                hook,
            )?,
        };

        if report.cancelled && report.epochs_run == 0 {
            return Err(TrainError::Cancelled);
        }

        self.metrics.record_fit(&report);
        self.metrics.finalise(self.started.elapsed());
        tracing::info!("{}", self.metrics.summary());

        Ok(TrainingPipeline {
            spec: self.spec,
            config: self.config,
            model_config: self.model_config,
            encoder: self.encoder,
            cancel: self.cancel,
            corpus: self.corpus,
            reports: self.reports,
            metrics: self.metrics,
            started: self.started,
            model: Some(model),
            _state: std::marker::PhantomData,
        })
    }
}

impl TrainingPipeline<Trained> {
    /// The fitted predictor.
    pub fn model(&self) -> &LatencyModel {
        self.model.as_ref().expect("model exists in Trained state")
    }

    /// Metrics of the completed run.
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Unwraps into a [`TrainedPredictor`] with fresh provenance.
    pub fn into_predictor(self) -> TrainedPredictor {
        TrainedPredictor {
            model: self.model.expect("model exists in Trained state"),
            provenance: Provenance::FreshlyTrained,
            metrics: Some(self.metrics),
        }
    }
}

impl<S: PipelineState> TrainingPipeline<S> {
    /// One collection pass: seeded subsample, then build → encode →
    /// measure per plan, excluding failures.
    async fn collect_pass(&mut self, plans: &[ExecutionPlan], profiler: Arc<dyn Profiler>) {
        let pass_start = Instant::now();
        let policy = RetryPolicy {
            attempts: self.config.measure_attempts,
            timeout: self.config.measure_timeout(),
        };

        // Seeded subsample: reproducible for a fixed seed and plan order.
        let fraction = self.config.sample_fraction.clamp(0.0, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let selected: Vec<&ExecutionPlan> = plans
            .iter()
            .filter(|_| fraction >= 1.0 || rng.gen_bool(fraction))
            .collect();
        let sampled_out = plans.len() - selected.len();

        tracing::info!(
            "collecting {} of {} plans via '{}' profiler",
            selected.len(),
            plans.len(),
            profiler.name(),
        );

        let mut collected = 0usize;
        let mut skipped: Vec<SkippedPlan> = Vec::new();

        for plan in selected {
            if self.cancel.is_cancelled() {
                tracing::info!("collection cancelled; keeping {collected} examples");
                break;
            }

            let graph = match GraphBuilder::build(plan, &self.spec) {
                Ok(graph) => graph,
                Err(e) => {
                    skipped.push(SkippedPlan {
                        plan: plan.cache_key(),
                        reason: e.to_string(),
                        attempts: 0,
                    });
                    continue;
                }
            };
            let encoded = match self.encoder.encode(&graph) {
                Ok(encoded) => encoded,
                Err(e) => {
                    skipped.push(SkippedPlan {
                        plan: plan.cache_key(),
                        reason: e.to_string(),
                        attempts: 0,
                    });
                    continue;
                }
            };

            match measure_with_retry(Arc::clone(&profiler), plan.clone(), policy).await {
                Ok(latency) => {
                    self.corpus.push(TrainingExample {
                        encoded,
                        latency_secs: latency.as_secs_f64(),
                    });
                    collected += 1;
                }
                Err(failure) => {
                    let attempts = if failure.is_transient() {
                        policy.attempts
                    } else {
                        1
                    };
                    tracing::warn!("excluding plan after {attempts} attempt(s): {failure}");
                    skipped.push(SkippedPlan {
                        plan: plan.cache_key(),
                        reason: failure.to_string(),
                        attempts,
                    });
                }
            }
        }

        let report = CollectionReport {
            collected,
            skipped,
            wall: pass_start.elapsed(),
        };
        tracing::info!("{}", report.summary());
        self.metrics.record_collection(&report, sampled_out);
        self.reports.push(report);
    }
}

impl<S: PipelineState> std::fmt::Debug for TrainingPipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingPipeline")
            .field("state", &std::any::type_name::<S>())
            .field("benchmark", &self.spec.name)
            .field("corpus_len", &self.corpus.len())
            .field("has_model", &self.model.is_some())
            .finish()
    }
}

// ── Orchestration ──────────────────────────────────────────────────

/// Trains a predictor for `key`, or loads the stored one.
///
/// Policy:
/// - If a compatible artifact exists and `config.reuse_pretrained` is
///   set, load it and skip training entirely.
/// - Otherwise collect → fit → persist under the key's advisory lock.
///   An existing artifact makes this a [`StoreError::DestinationConflict`]
///   unless `config.overwrite` is set — checked *before* the expensive
///   collection, not after.
/// - With `config.warm_start`, an existing artifact seeds the fit
///   instead of being discarded.
/// - With `config.checkpoint_every`, the artifact is also written at
///   every N-th epoch boundary.
///
/// Loading an artifact with an incompatible feature schema fails with
/// [`StoreError::SchemaMismatch`]; the caller must retrain.
pub async fn train_or_load(
    store: &ArtifactStore,
    key: &ArtifactKey,
    spec: &ModelSpec,
    plans: &[ExecutionPlan],
    profiler: Arc<dyn Profiler>,
    config: &TrainerConfig,
    cancel: &CancelToken,
) -> Result<TrainedPredictor, TrainError> {
    if config.reuse_pretrained && store.exists(key) {
        let model = store.load(key)?;
        tracing::info!("reusing pretrained predictor for {key}");
        return Ok(TrainedPredictor::loaded(model));
    }

    let _lock = store.lock(key)?;

    if store.exists(key) && !config.overwrite {
        return Err(StoreError::DestinationConflict {
            path: store.root().join(format!("{}.safetensors", key.file_stem())),
        }
        .into());
    }
    let warm = if config.warm_start && store.exists(key) {
        Some(store.load(key)?)
    } else {
        None
    };

    let collected = TrainingPipeline::new(spec.clone(), config.clone())
        .with_cancel(cancel.clone())
        .collect(plans, profiler)
        .await;

    let trained = match config.checkpoint_every {
        Some(every) if every > 0 => {
            let mut hook = |epoch: usize, _loss: f32, model: &LatencyModel| {
                if epoch % every == 0 {
                    // A failed checkpoint must not kill the run; the
                    // final save below still reports real errors.
                    if let Err(e) = store.save(key, model, true) {
                        tracing::warn!("checkpoint save at epoch {epoch} failed: {e}");
                    }
                }
            };
            collected.fit_inner(warm, Some(&mut hook))?
        }
        _ => collected.fit_inner(warm, None)?,
    };

    let predictor = trained.into_predictor();
    // Overwrite is forced here: the conflict was resolved before
    // training and checkpoints may already have written the record.
    store.save(key, predictor.model(), true)?;
    Ok(predictor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MeasureFailure, SyntheticProfiler};
    use plan_ir::DeviceMesh;
    use std::time::Duration;

    fn spec() -> ModelSpec {
        ModelSpec::by_name("gpt-350M").unwrap()
    }

    fn mesh() -> DeviceMesh {
        DeviceMesh::new(2, 2, "a100")
    }

    /// Feasible plans on the 2×2 mesh across micro-batch counts.
    fn plans() -> Vec<ExecutionPlan> {
        let degrees = [(4, 1, 1), (2, 2, 1), (2, 1, 2), (1, 2, 2), (1, 1, 4)];
        let mut out = Vec::new();
        for &mb in &[8usize, 16, 32] {
            for &(dp, tp, pp) in &degrees {
                out.push(ExecutionPlan::uniform(dp, tp, pp, mesh(), 24, mb).unwrap());
            }
        }
        out
    }

    fn quick_config() -> TrainerConfig {
        TrainerConfig {
            train: cost_model::TrainConfig {
                epochs: 30,
                min_examples: 4,
                log_every: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_collect_then_fit() {
        let profiler = Arc::new(SyntheticProfiler::new(spec()));
        let collected = TrainingPipeline::new(spec(), quick_config())
            .collect(&plans(), profiler)
            .await;
        assert_eq!(collected.corpus_len(), 15);
        assert_eq!(collected.reports().len(), 1);

        let trained = collected.fit().unwrap();
        assert!(trained.metrics().final_loss.is_finite());
        assert_eq!(trained.metrics().epochs_run, 30);

        let predictor = trained.into_predictor();
        assert_eq!(predictor.provenance(), Provenance::FreshlyTrained);
        assert!(predictor.metrics().is_some());
    }

    #[tokio::test]
    async fn test_infeasible_plans_skipped_not_fatal() {
        let mut all = plans();
        // tp=4 does not divide 2 devices per host.
        all.push(ExecutionPlan::uniform(1, 4, 1, mesh(), 24, 8).unwrap());

        let profiler = Arc::new(SyntheticProfiler::new(spec()));
        let collected = TrainingPipeline::new(spec(), quick_config())
            .collect(&all, profiler)
            .await;

        assert_eq!(collected.corpus_len(), 15);
        let report = &collected.reports()[0];
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].attempts, 0);
    }

    #[tokio::test]
    async fn test_corpus_accumulates_across_passes() {
        let profiler: Arc<dyn Profiler> = Arc::new(SyntheticProfiler::new(spec()));
        let collected = TrainingPipeline::new(spec(), quick_config())
            .collect(&plans()[..5], Arc::clone(&profiler))
            .await;
        assert_eq!(collected.corpus_len(), 5);

        let collected = collected.collect_more(&plans()[5..10], profiler).await;
        assert_eq!(collected.corpus_len(), 10);
        assert_eq!(collected.reports().len(), 2);
    }

    #[tokio::test]
    async fn test_sample_fraction_is_seeded() {
        let config = TrainerConfig {
            sample_fraction: 0.5,
            ..quick_config()
        };
        let profiler: Arc<dyn Profiler> = Arc::new(SyntheticProfiler::new(spec()));

        let a = TrainingPipeline::new(spec(), config.clone())
            .collect(&plans(), Arc::clone(&profiler))
            .await;
        let b = TrainingPipeline::new(spec(), config)
            .collect(&plans(), profiler)
            .await;

        assert_eq!(a.corpus_len(), b.corpus_len());
        assert!(a.corpus_len() < 15, "subsample kept everything");
    }

    #[tokio::test]
    async fn test_all_skipped_yields_no_examples_error() {
        struct AlwaysFails;
        impl Profiler for AlwaysFails {
            fn name(&self) -> &str {
                "never"
            }
            fn measure(&self, _: &ExecutionPlan) -> Result<Duration, MeasureFailure> {
                Err(MeasureFailure::Rejected("unsupported".into()))
            }
        }

        let collected = TrainingPipeline::new(spec(), quick_config())
            .collect(&plans()[..3], Arc::new(AlwaysFails))
            .await;
        assert!(matches!(
            collected.fit(),
            Err(TrainError::NoExamplesCollected { skipped: 3 })
        ));
    }

    #[tokio::test]
    async fn test_cancel_stops_collection() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let collected = TrainingPipeline::new(spec(), quick_config())
            .with_cancel(cancel)
            .collect(&plans(), Arc::new(SyntheticProfiler::new(spec())))
            .await;
        assert_eq!(collected.corpus_len(), 0);
        assert!(matches!(collected.fit(), Err(TrainError::Cancelled) | Err(TrainError::NoExamplesCollected { .. })));
    }

    #[tokio::test]
    async fn test_train_or_load_trains_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("models")).unwrap();
        let key = ArtifactKey::new("gpt-350M", &mesh().signature());
        let profiler: Arc<dyn Profiler> = Arc::new(SyntheticProfiler::new(spec()));
        let config = quick_config();
        let cancel = CancelToken::new();

        // First run: nothing stored, trains and persists.
        let first = train_or_load(&store, &key, &spec(), &plans(), Arc::clone(&profiler), &config, &cancel)
            .await
            .unwrap();
        assert_eq!(first.provenance(), Provenance::FreshlyTrained);
        assert!(store.exists(&key));

        // Second run: artifact reused, no retraining.
        let second = train_or_load(&store, &key, &spec(), &plans(), profiler, &config, &cancel)
            .await
            .unwrap();
        assert_eq!(second.provenance(), Provenance::LoadedFromStore);
        assert!(second.metrics().is_none());
    }

    #[tokio::test]
    async fn test_train_or_load_refuses_unconfirmed_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("models")).unwrap();
        let key = ArtifactKey::new("gpt-350M", &mesh().signature());
        let profiler: Arc<dyn Profiler> = Arc::new(SyntheticProfiler::new(spec()));
        let cancel = CancelToken::new();

        let config = quick_config();
        train_or_load(&store, &key, &spec(), &plans(), Arc::clone(&profiler), &config, &cancel)
            .await
            .unwrap();

        // Retrain requested (reuse off) but overwrite not confirmed.
        let retrain = TrainerConfig {
            reuse_pretrained: false,
            ..quick_config()
        };
        let result =
            train_or_load(&store, &key, &spec(), &plans(), Arc::clone(&profiler), &retrain, &cancel).await;
        assert!(matches!(
            result,
            Err(TrainError::Store(StoreError::DestinationConflict { .. }))
        ));

        // Confirmed overwrite retrains.
        let confirmed = TrainerConfig {
            reuse_pretrained: false,
            overwrite: true,
            ..quick_config()
        };
        let retrained =
            train_or_load(&store, &key, &spec(), &plans(), profiler, &confirmed, &cancel)
                .await
                .unwrap();
        assert_eq!(retrained.provenance(), Provenance::FreshlyTrained);
    }

    #[tokio::test]
    async fn test_train_or_load_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("models")).unwrap();
        let key = ArtifactKey::new("gpt-350M", &mesh().signature());
        let config = TrainerConfig {
            train: cost_model::TrainConfig {
                min_examples: 10,
                log_every: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let result = train_or_load(
            &store,
            &key,
            &spec(),
            &plans()[..2],
            Arc::new(SyntheticProfiler::new(spec())),
            &config,
            &CancelToken::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(TrainError::Model(cost_model::ModelError::InsufficientData { got: 2, min: 10 }))
        ));
        // Nothing was persisted for the failed run.
        assert!(!store.exists(&key));
    }

    #[tokio::test]
    async fn test_checkpoints_written_at_epoch_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("models")).unwrap();
        let key = ArtifactKey::new("gpt-350M", &mesh().signature());
        let config = TrainerConfig {
            checkpoint_every: Some(10),
            ..quick_config()
        };

        let predictor = train_or_load(
            &store,
            &key,
            &spec(),
            &plans(),
            Arc::new(SyntheticProfiler::new(spec())),
            &config,
            &CancelToken::new(),
        )
        .await
        .unwrap();

        // The final artifact matches the returned predictor.
        let loaded = store.load(&key).unwrap();
        assert_eq!(loaded.normalization(), predictor.model().normalization());
    }

    #[tokio::test]
    async fn test_warm_start_uses_stored_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("models")).unwrap();
        let key = ArtifactKey::new("gpt-350M", &mesh().signature());
        let profiler: Arc<dyn Profiler> = Arc::new(SyntheticProfiler::new(spec()));
        let cancel = CancelToken::new();

        let first = train_or_load(
            &store,
            &key,
            &spec(),
            &plans(),
            Arc::clone(&profiler),
            &quick_config(),
            &cancel,
        )
        .await
        .unwrap();
        let norm = first.model().normalization();

        // Warm start keeps the stored normalization constants.
        let warm = TrainerConfig {
            reuse_pretrained: false,
            warm_start: true,
            overwrite: true,
            ..quick_config()
        };
        let tuned = train_or_load(&store, &key, &spec(), &plans(), profiler, &warm, &cancel)
            .await
            .unwrap();
        assert_eq!(tuned.model().normalization(), norm);
        assert_eq!(tuned.provenance(), Provenance::FreshlyTrained);
    }
}
