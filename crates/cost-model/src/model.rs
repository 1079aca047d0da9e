// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The latency predictor: a single-head attention regressor.
//!
//! # Architecture
//!
//! ```text
//! H0 = gelu(X·W_in + b_in)            X: n×F node features
//! S  = (Q·Kᵀ)/√D + bias               Q,K,V = H0·W{q,k,v}; bias: DAG mask
//! A  = softmax_rows(S)
//! H1 = H0 + (A·V)·W_o                 residual
//! p  = mean_rows(H1)                  graph pooling
//! ŷ  = gelu(p·W1 + b1)·w2 + b2        scalar, normalized log-latency
//! ```
//!
//! The attention bias is the encoder's partial-order mask, so a node
//! only attends along dependency chains. The output is trained against
//! z-scored `ln(latency)`; [`LatencyModel::predict`] de-normalizes back
//! to seconds, which also makes the returned latency non-negative by
//! construction.
//!
//! Inference is `&self` and allocation-pure: the model is safe to share
//! across the search worker pool once loaded.

use crate::ops::{gelu, gelu_backward, softmax_backward_rows, softmax_rows};
use crate::{Matrix, ModelError};
use graph_encode::{EncodedGraph, FEATURE_SCHEMA_VERSION, FEATURE_WIDTH};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Model hyper-parameters and the feature schema it was built against.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModelConfig {
    /// Expected node feature width.
    pub feature_width: usize,
    /// Expected feature schema version.
    pub schema_version: u32,
    /// Attention dimension.
    pub d_model: usize,
    /// Regression head hidden width.
    pub hidden: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            feature_width: FEATURE_WIDTH,
            schema_version: FEATURE_SCHEMA_VERSION,
            d_model: 32,
            hidden: 32,
        }
    }
}

/// Normalization constants for the training targets: mean and standard
/// deviation of `ln(latency_secs)` over the corpus.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Normalization {
    pub mean: f32,
    pub std: f32,
}

impl Default for Normalization {
    fn default() -> Self {
        Self { mean: 0.0, std: 1.0 }
    }
}

/// Whether a model was trained in this process or restored from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    FreshlyTrained,
    LoadedFromStore,
}

// ── Parameters ─────────────────────────────────────────────────────

/// All trainable parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Params {
    pub w_in: Matrix, // F×D
    pub b_in: Matrix, // 1×D
    pub wq: Matrix,   // D×D
    pub wk: Matrix,   // D×D
    pub wv: Matrix,   // D×D
    pub wo: Matrix,   // D×D
    pub w1: Matrix,   // D×H
    pub b1: Matrix,   // 1×H
    pub w2: Matrix,   // H×1
    pub b2: Matrix,   // 1×1
}

impl Params {
    /// Xavier-uniform initialisation from a seeded generator.
    pub fn init(config: &ModelConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (f, d, h) = (config.feature_width, config.d_model, config.hidden);
        let mut xavier = |rows: usize, cols: usize| {
            let bound = (6.0 / (rows + cols) as f32).sqrt();
            let data = (0..rows * cols)
                .map(|_| rng.gen_range(-bound..bound))
                .collect();
            Matrix::from_vec(rows, cols, data)
        };
        Self {
            w_in: xavier(f, d),
            b_in: Matrix::zeros(1, d),
            wq: xavier(d, d),
            wk: xavier(d, d),
            wv: xavier(d, d),
            wo: xavier(d, d),
            w1: xavier(d, h),
            b1: Matrix::zeros(1, h),
            w2: xavier(h, 1),
            b2: Matrix::zeros(1, 1),
        }
    }

    pub fn zeros_like(config: &ModelConfig) -> Self {
        let (f, d, h) = (config.feature_width, config.d_model, config.hidden);
        Self {
            w_in: Matrix::zeros(f, d),
            b_in: Matrix::zeros(1, d),
            wq: Matrix::zeros(d, d),
            wk: Matrix::zeros(d, d),
            wv: Matrix::zeros(d, d),
            wo: Matrix::zeros(d, d),
            w1: Matrix::zeros(d, h),
            b1: Matrix::zeros(1, h),
            w2: Matrix::zeros(h, 1),
            b2: Matrix::zeros(1, 1),
        }
    }

    /// Parameter tensors in a fixed, stable order.
    pub fn fields(&self) -> [(&'static str, &Matrix); 10] {
        [
            ("w_in", &self.w_in),
            ("b_in", &self.b_in),
            ("wq", &self.wq),
            ("wk", &self.wk),
            ("wv", &self.wv),
            ("wo", &self.wo),
            ("w1", &self.w1),
            ("b1", &self.b1),
            ("w2", &self.w2),
            ("b2", &self.b2),
        ]
    }

    pub fn fields_mut(&mut self) -> [(&'static str, &mut Matrix); 10] {
        [
            ("w_in", &mut self.w_in),
            ("b_in", &mut self.b_in),
            ("wq", &mut self.wq),
            ("wk", &mut self.wk),
            ("wv", &mut self.wv),
            ("wo", &mut self.wo),
            ("w1", &mut self.w1),
            ("b1", &mut self.b1),
            ("w2", &mut self.w2),
            ("b2", &mut self.b2),
        ]
    }

    pub fn zero_all(&mut self) {
        for (_, m) in self.fields_mut() {
            m.fill_zero();
        }
    }
}

// ── Forward cache ──────────────────────────────────────────────────

/// Intermediate activations kept for the backward pass.
pub(crate) struct ForwardCache {
    x: Matrix,
    pre0: Matrix,
    h0: Matrix,
    q: Matrix,
    k: Matrix,
    v: Matrix,
    attn: Matrix,
    ctx: Matrix,
    pooled: Matrix,
    pre1: Matrix,
    z: Matrix,
}

// ── Model ──────────────────────────────────────────────────────────

/// A trained (or trainable) latency predictor.
#[derive(Debug, Clone)]
pub struct LatencyModel {
    config: ModelConfig,
    pub(crate) params: Params,
    norm: Normalization,
}

impl LatencyModel {
    /// Creates a model with seeded random initialisation.
    pub fn new(config: ModelConfig, seed: u64) -> Self {
        let params = Params::init(&config, seed);
        Self {
            config,
            params,
            norm: Normalization::default(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn normalization(&self) -> Normalization {
        self.norm
    }

    pub fn set_normalization(&mut self, norm: Normalization) {
        self.norm = norm;
    }

    /// Predicts the latency of an encoded plan graph, in seconds.
    ///
    /// Pure and `&self`: safe to call concurrently from many workers.
    ///
    /// # Errors
    /// - [`ModelError::SchemaMismatch`] if the encoding's schema version
    ///   or feature width differs from the model's.
    /// - [`ModelError::NonFinite`] if the output is NaN or infinite.
    pub fn predict(&self, encoded: &EncodedGraph) -> Result<f64, ModelError> {
        self.check_schema(encoded)?;
        let (y, _) = self.forward(encoded);
        let latency = ((y * self.norm.std + self.norm.mean) as f64).exp();
        if !latency.is_finite() {
            return Err(ModelError::NonFinite {
                context: "prediction",
            });
        }
        Ok(latency)
    }

    /// Raw normalized output, without de-normalization. Used by training.
    pub(crate) fn forward_normalized(&self, encoded: &EncodedGraph) -> (f32, ForwardCache) {
        self.forward(encoded)
    }

    pub(crate) fn check_schema(&self, encoded: &EncodedGraph) -> Result<(), ModelError> {
        if encoded.schema_version != self.config.schema_version
            || encoded.feature_width != self.config.feature_width
        {
            return Err(ModelError::SchemaMismatch {
                expected_version: self.config.schema_version,
                expected_width: self.config.feature_width,
                actual_version: encoded.schema_version,
                actual_width: encoded.feature_width,
            });
        }
        Ok(())
    }

    fn forward(&self, encoded: &EncodedGraph) -> (f32, ForwardCache) {
        let n = encoded.num_nodes;
        let d = self.config.d_model;
        let p = &self.params;

        let x = Matrix::from_vec(n, self.config.feature_width, encoded.features.clone());

        let mut pre0 = x.matmul(&p.w_in);
        pre0.add_row_broadcast(&p.b_in);
        let h0 = gelu(&pre0);

        let q = h0.matmul(&p.wq);
        let k = h0.matmul(&p.wk);
        let v = h0.matmul(&p.wv);

        let mut scores = q.matmul_nt(&k);
        scores.scale(1.0 / (d as f32).sqrt());
        for i in 0..n {
            let row = scores.row_mut(i);
            for (s, &b) in row.iter_mut().zip(encoded.bias_row(i)) {
                *s += b;
            }
        }
        softmax_rows(&mut scores);
        let attn = scores;

        let ctx = attn.matmul(&v);
        let proj = ctx.matmul(&p.wo);
        let mut h1 = h0.clone();
        h1.add_assign(&proj);

        let pooled = h1.mean_rows();

        let mut pre1 = pooled.matmul(&p.w1);
        pre1.add_row_broadcast(&p.b1);
        let z = gelu(&pre1);

        let y = z.matmul(&p.w2).at(0, 0) + p.b2.at(0, 0);

        let cache = ForwardCache {
            x,
            pre0,
            h0,
            q,
            k,
            v,
            attn,
            ctx,
            pooled,
            pre1,
            z,
        };
        (y, cache)
    }

    /// Accumulates parameter gradients for one example into `grads`.
    ///
    /// `dy` is the loss gradient at the scalar output.
    pub(crate) fn backward(&self, cache: &ForwardCache, dy: f32, grads: &mut Params) {
        let p = &self.params;
        let n = cache.h0.rows();
        let d = self.config.d_model;

        // Head: y = z·w2 + b2.
        grads.b2.data_mut()[0] += dy;
        let dy_mat = Matrix::from_vec(1, 1, vec![dy]);
        grads.w2.add_assign(&cache.z.matmul_tn(&dy_mat));
        let mut dz = Matrix::zeros(1, self.config.hidden);
        for j in 0..self.config.hidden {
            dz.set(0, j, dy * p.w2.at(j, 0));
        }

        // z = gelu(pre1); pre1 = pooled·w1 + b1.
        let dpre1 = gelu_backward(&cache.pre1, &dz);
        grads.w1.add_assign(&cache.pooled.matmul_tn(&dpre1));
        grads.b1.add_assign(&dpre1);
        let dpooled = dpre1.matmul_nt(&p.w1);

        // pooled = mean_rows(h1): spread the gradient evenly.
        let inv_n = 1.0 / n as f32;
        let mut dh1 = Matrix::zeros(n, d);
        for i in 0..n {
            for j in 0..d {
                dh1.set(i, j, dpooled.at(0, j) * inv_n);
            }
        }

        // h1 = h0 + ctx·wo.
        let mut dh0 = dh1.clone();
        grads.wo.add_assign(&cache.ctx.matmul_tn(&dh1));
        let dctx = dh1.matmul_nt(&p.wo);

        // ctx = attn·v.
        let dattn = dctx.matmul_nt(&cache.v);
        let dv = cache.attn.matmul_tn(&dctx);

        // attn = softmax(scores); scores = q·kᵀ/√d + bias (bias constant).
        let dscores = softmax_backward_rows(&cache.attn, &dattn);
        let scale = 1.0 / (d as f32).sqrt();
        let mut dq = dscores.matmul(&cache.k);
        dq.scale(scale);
        let mut dk = dscores.matmul_tn(&cache.q);
        dk.scale(scale);

        // q/k/v projections.
        grads.wq.add_assign(&cache.h0.matmul_tn(&dq));
        grads.wk.add_assign(&cache.h0.matmul_tn(&dk));
        grads.wv.add_assign(&cache.h0.matmul_tn(&dv));
        dh0.add_assign(&dq.matmul_nt(&p.wq));
        dh0.add_assign(&dk.matmul_nt(&p.wk));
        dh0.add_assign(&dv.matmul_nt(&p.wv));

        // h0 = gelu(pre0); pre0 = x·w_in + b_in.
        let dpre0 = gelu_backward(&cache.pre0, &dh0);
        grads.w_in.add_assign(&cache.x.matmul_tn(&dpre0));
        grads.b_in.add_assign(&dpre0.sum_rows());
    }

    // ── Persistence hooks (used by the artifact store) ─────────────

    /// Parameter tensors as `(name, shape, data)` views, in a stable order.
    pub fn tensor_views(&self) -> Vec<(&'static str, Vec<usize>, &[f32])> {
        self.params
            .fields()
            .into_iter()
            .map(|(name, m)| (name, vec![m.rows(), m.cols()], m.data()))
            .collect()
    }

    /// Restores a model from named parameter tensors.
    ///
    /// # Errors
    /// [`ModelError::MissingTensor`] / [`ModelError::TensorShape`] when
    /// the tensor set does not match `config`.
    pub fn from_tensors(
        config: ModelConfig,
        norm: Normalization,
        mut tensors: std::collections::HashMap<String, (Vec<usize>, Vec<f32>)>,
    ) -> Result<Self, ModelError> {
        let mut params = Params::zeros_like(&config);
        for (name, target) in params.fields_mut() {
            let (shape, data) = tensors
                .remove(name)
                .ok_or_else(|| ModelError::MissingTensor { name: name.into() })?;
            let expected = vec![target.rows(), target.cols()];
            if shape != expected {
                return Err(ModelError::TensorShape {
                    name: name.into(),
                    expected,
                    actual: shape,
                });
            }
            *target = Matrix::from_vec(target.rows(), target.cols(), data);
        }
        Ok(Self {
            config,
            params,
            norm,
        })
    }
}
