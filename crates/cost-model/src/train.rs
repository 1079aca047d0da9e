// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fitting the predictor to observed latencies.
//!
//! Training minimises the mean-squared error between the model's raw
//! output and the z-scored natural log of the observed latency. Latency
//! magnitudes vary by orders of magnitude across plan sizes; the log
//! transform keeps every example on a comparable scale, and the z-score
//! constants are stored on the model so predictions de-normalize back
//! to seconds.
//!
//! Optimisation is full-batch Adam for a configured number of epochs.
//! Cancellation is checked at epoch boundaries only: the model is
//! consistent whenever the loop is observed, so a cancelled fit still
//! returns a usable (partially trained) model with `cancelled` set in
//! its report.

use crate::model::Params;
use crate::optim::Adam;
use crate::{CancelToken, LatencyModel, ModelConfig, ModelError, Normalization};
use graph_encode::EncodedGraph;

/// One observed `(plan graph, latency)` pair.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    /// The encoded plan graph.
    pub encoded: EncodedGraph,
    /// Ground-truth latency in seconds. Must be positive.
    pub latency_secs: f64,
}

/// Training hyper-parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrainConfig {
    /// Number of full-batch epochs.
    pub epochs: usize,
    /// Adam learning rate.
    pub learning_rate: f32,
    /// Minimum corpus size; below this `fit` fails with
    /// [`ModelError::InsufficientData`].
    pub min_examples: usize,
    /// Seed for parameter initialisation.
    pub seed: u64,
    /// Epoch-loss logging interval.
    pub log_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 1e-2,
            min_examples: 8,
            seed: 42,
            log_every: 50,
        }
    }
}

/// Summary of a completed (or cancelled) fit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrainReport {
    /// Epochs actually run.
    pub epochs_run: usize,
    /// Mean-squared error on normalized targets after the last epoch.
    pub final_loss: f32,
    /// Number of examples in the corpus.
    pub examples: usize,
    /// True if training stopped early due to cancellation.
    pub cancelled: bool,
}

/// Hook invoked after each epoch with `(epoch, loss, model)`.
///
/// Used by the training pipeline to persist checkpoints at epoch
/// boundaries.
pub type EpochHook<'a> = &'a mut dyn FnMut(usize, f32, &LatencyModel);

/// Fits a fresh model to the corpus.
///
/// Initialises parameters from `config.seed`, computes the target
/// normalization from the corpus, and trains for `config.epochs`.
pub fn fit(
    examples: &[TrainingExample],
    model_config: ModelConfig,
    config: &TrainConfig,
    cancel: &CancelToken,
) -> Result<(LatencyModel, TrainReport), ModelError> {
    fit_with_hook(examples, model_config, config, cancel, None)
}

/// [`fit`] with an optional per-epoch checkpoint hook.
pub fn fit_with_hook(
    examples: &[TrainingExample],
    model_config: ModelConfig,
    config: &TrainConfig,
    cancel: &CancelToken,
    hook: Option<EpochHook<'_>>,
) -> Result<(LatencyModel, TrainReport), ModelError> {
    check_corpus(examples, config)?;

    let mut model = LatencyModel::new(model_config, config.seed);
    model.set_normalization(corpus_normalization(examples));
    train_loop(&mut model, examples, config, cancel, hook).map(|report| (model, report))
}

/// Continues training from an existing model (warm start).
///
/// Keeps the model's parameters and normalization constants so that
/// fine-tuning does not shift the output scale under the caller.
pub fn fit_from(
    model: LatencyModel,
    examples: &[TrainingExample],
    config: &TrainConfig,
    cancel: &CancelToken,
) -> Result<(LatencyModel, TrainReport), ModelError> {
    fit_from_with_hook(model, examples, config, cancel, None)
}

/// [`fit_from`] with an optional per-epoch checkpoint hook.
pub fn fit_from_with_hook(
    mut model: LatencyModel,
    examples: &[TrainingExample],
    config: &TrainConfig,
    cancel: &CancelToken,
    hook: Option<EpochHook<'_>>,
) -> Result<(LatencyModel, TrainReport), ModelError> {
    check_corpus(examples, config)?;
    let report = train_loop(&mut model, examples, config, cancel, hook)?;
    Ok((model, report))
}

fn check_corpus(examples: &[TrainingExample], config: &TrainConfig) -> Result<(), ModelError> {
    if examples.len() < config.min_examples {
        return Err(ModelError::InsufficientData {
            got: examples.len(),
            min: config.min_examples,
        });
    }
    Ok(())
}

/// Mean and standard deviation of `ln(latency)` over the corpus.
fn corpus_normalization(examples: &[TrainingExample]) -> Normalization {
    let logs: Vec<f32> = examples
        .iter()
        .map(|ex| (ex.latency_secs.max(1e-9) as f32).ln())
        .collect();
    let mean = logs.iter().sum::<f32>() / logs.len() as f32;
    let var = logs.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / logs.len() as f32;
    let std = var.sqrt();
    Normalization {
        mean,
        // A flat corpus (identical latencies) would otherwise divide by
        // zero during normalization.
        std: if std < 1e-6 { 1.0 } else { std },
    }
}

fn train_loop(
    model: &mut LatencyModel,
    examples: &[TrainingExample],
    config: &TrainConfig,
    cancel: &CancelToken,
    mut hook: Option<EpochHook<'_>>,
) -> Result<TrainReport, ModelError> {
    for ex in examples {
        model.check_schema(&ex.encoded)?;
    }

    let norm = model.normalization();
    let targets: Vec<f32> = examples
        .iter()
        .map(|ex| ((ex.latency_secs.max(1e-9) as f32).ln() - norm.mean) / norm.std)
        .collect();

    let mut adam = Adam::new(model.config(), config.learning_rate);
    let mut grads = Params::zeros_like(model.config());
    let mut last_loss = f32::NAN;
    let mut epochs_run = 0;
    let mut cancelled = false;
    let inv_n = 1.0 / examples.len() as f32;

    for epoch in 0..config.epochs {
        if cancel.is_cancelled() {
            cancelled = true;
            tracing::info!("training cancelled after {epochs_run} epochs");
            break;
        }

        grads.zero_all();
        let mut loss = 0.0f32;
        for (ex, &target) in examples.iter().zip(&targets) {
            let (y, cache) = model.forward_normalized(&ex.encoded);
            let err = y - target;
            loss += err * err * inv_n;
            model.backward(&cache, 2.0 * err * inv_n, &mut grads);
        }

        if !loss.is_finite() {
            return Err(ModelError::NonFinite { context: "training loss" });
        }

        adam.step(&mut model.params, &grads);
        last_loss = loss;
        epochs_run = epoch + 1;

        if config.log_every > 0 && epochs_run % config.log_every == 0 {
            tracing::debug!(epoch = epochs_run, loss, "training progress");
        }
        if let Some(hook) = hook.as_mut() {
            hook(epochs_run, loss, model);
        }
    }

    Ok(TrainReport {
        epochs_run,
        final_loss: last_loss,
        examples: examples.len(),
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_encode::{EncoderConfig, GraphEncoder};
    use plan_ir::{DeviceMesh, ExecutionPlan, GraphBuilder, ModelSpec};

    /// Builds a small synthetic corpus: encodings of real plan graphs
    /// with latencies that grow with communication volume.
    fn corpus(n: usize) -> Vec<TrainingExample> {
        let spec = ModelSpec::by_name("gpt-350M").unwrap();
        let mesh = DeviceMesh::new(2, 2, "a100");
        let encoder = GraphEncoder::new(EncoderConfig { max_nodes: 512 });

        let degree_choices = [(1, 2, 2), (2, 2, 1), (4, 1, 1), (1, 1, 4), (2, 1, 2), (1, 2, 2)];
        let micro_batches = [8, 16, 32, 64];

        let mut examples = Vec::new();
        'outer: for &mb in &micro_batches {
            for &(dp, tp, pp) in &degree_choices {
                if examples.len() == n {
                    break 'outer;
                }
                let plan =
                    ExecutionPlan::uniform(dp, tp, pp, mesh.clone(), spec.num_layers, mb).unwrap();
                if plan.validate(&spec).is_err() {
                    continue;
                }
                let graph = GraphBuilder::build(&plan, &spec).unwrap();
                let encoded = encoder.encode(&graph).unwrap();
                let latency = 0.5 + graph.total_comm_volume() as f64 / 1e10 + mb as f64 * 0.01;
                examples.push(TrainingExample {
                    encoded,
                    latency_secs: latency,
                });
            }
        }
        assert!(examples.len() >= n.min(12), "corpus too small: {}", examples.len());
        examples
    }

    fn quick_config() -> TrainConfig {
        TrainConfig {
            epochs: 40,
            learning_rate: 1e-2,
            min_examples: 4,
            seed: 42,
            log_every: 0,
        }
    }

    #[test]
    fn test_insufficient_data() {
        let examples = corpus(2);
        let config = TrainConfig {
            min_examples: 10,
            ..quick_config()
        };
        let result = fit(&examples[..2], ModelConfig::default(), &config, &CancelToken::new());
        assert!(matches!(
            result,
            Err(ModelError::InsufficientData { got: 2, min: 10 })
        ));
    }

    #[test]
    fn test_fit_reduces_loss() {
        let examples = corpus(12);
        let cancel = CancelToken::new();

        let short = TrainConfig { epochs: 1, ..quick_config() };
        let (_, first) = fit(&examples, ModelConfig::default(), &short, &cancel).unwrap();

        let long = TrainConfig { epochs: 120, ..quick_config() };
        let (_, trained) = fit(&examples, ModelConfig::default(), &long, &cancel).unwrap();

        assert!(trained.final_loss.is_finite());
        assert!(
            trained.final_loss < first.final_loss,
            "loss did not improve: {} -> {}",
            first.final_loss,
            trained.final_loss
        );
    }

    #[test]
    fn test_fit_predictions_are_in_latency_range() {
        let examples = corpus(12);
        let config = TrainConfig { epochs: 150, ..quick_config() };
        let (model, _) = fit(&examples, ModelConfig::default(), &config, &CancelToken::new()).unwrap();

        for ex in &examples {
            let pred = model.predict(&ex.encoded).unwrap();
            assert!(pred.is_finite() && pred > 0.0);
            // Loose sanity band: within 100× of the observed value.
            assert!(pred < ex.latency_secs * 100.0 && pred > ex.latency_secs / 100.0);
        }
    }

    #[test]
    fn test_cancelled_before_start_runs_zero_epochs() {
        let examples = corpus(8);
        let cancel = CancelToken::new();
        cancel.cancel();
        let (_, report) =
            fit(&examples, ModelConfig::default(), &quick_config(), &cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.epochs_run, 0);
    }

    #[test]
    fn test_warm_start_continues() {
        let examples = corpus(10);
        let cancel = CancelToken::new();
        let (model, _) = fit(&examples, ModelConfig::default(), &quick_config(), &cancel).unwrap();
        let norm_before = model.normalization();

        let (tuned, report) = fit_from(model, &examples, &quick_config(), &cancel).unwrap();
        assert_eq!(report.epochs_run, quick_config().epochs);
        // Warm start must not shift the output scale.
        assert_eq!(tuned.normalization(), norm_before);
    }

    #[test]
    fn test_epoch_hook_called() {
        let examples = corpus(8);
        let mut calls = 0usize;
        let mut hook = |_epoch: usize, _loss: f32, _model: &LatencyModel| calls += 1;
        let config = TrainConfig { epochs: 5, ..quick_config() };
        fit_with_hook(
            &examples,
            ModelConfig::default(),
            &config,
            &CancelToken::new(),
            Some(&mut hook),
        )
        .unwrap();
        assert_eq!(calls, 5);
    }
}
