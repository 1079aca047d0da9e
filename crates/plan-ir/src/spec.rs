// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmark model specifications.
//!
//! A [`ModelSpec`] describes the architecture being parallelised: its
//! family (dense transformer or mixture-of-experts), layer count, and
//! per-layer dimensions. The spec expands into an ordered operator
//! sequence via [`ModelSpec::operators`], which is what the graph
//! builder partitions across pipeline stages.
//!
//! Preset tables cover the benchmark configurations used for training
//! and evaluating the predictor (`gpt-350M`, `gpt-1.3B`, `moe-380M`,
//! `moe-1.3B`).

use std::fmt;

/// The benchmark model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Dense decoder-only transformer (GPT style).
    DenseTransformer,
    /// Mixture-of-experts transformer: every second feed-forward block
    /// is replaced by a routed expert block.
    MixtureOfExperts,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DenseTransformer => "dense_transformer",
            Self::MixtureOfExperts => "mixture_of_experts",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of computation an operator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Multi-head self-attention (QKV projection + attention + output projection).
    Attention,
    /// Dense feed-forward block (two projections, 4× expansion).
    FeedForward,
    /// Routed expert feed-forward block (MoE models only).
    MoeFeedForward,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attention => "attention",
            Self::FeedForward => "feed_forward",
            Self::MoeFeedForward => "moe_feed_forward",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operator in the model's execution order.
///
/// Cost fields are structural estimates for one training iteration over
/// the full global batch (forward + backward), before any division
/// across parallel degrees. The graph builder divides them by the
/// degrees of the stage the operator lands on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperatorDef {
    /// Operator name (e.g., `"layer.3.attn"`).
    pub name: String,
    /// Kind of computation.
    pub kind: OpKind,
    /// Index of the layer this operator belongs to.
    pub layer: usize,
    /// Estimated floating-point operations.
    pub flops: u64,
    /// Parameter bytes held by this operator.
    pub param_bytes: u64,
    /// Output activation bytes for the full global batch.
    pub activation_bytes: u64,
}

/// A benchmark model specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ModelSpec {
    /// Benchmark name (e.g., `"gpt-1.3B"`). Used as the artifact-store key.
    pub name: String,
    /// Model family.
    pub family: ModelFamily,
    /// Number of transformer layers.
    pub num_layers: usize,
    /// Hidden dimension.
    pub hidden_size: usize,
    /// Number of attention heads.
    pub num_attention_heads: usize,
    /// Number of experts per MoE block (`None` for dense models).
    pub num_experts: Option<usize>,
    /// Vocabulary size.
    pub vocab_size: usize,
    /// Training sequence length.
    pub seq_len: usize,
    /// Global batch size (sequences per training iteration).
    pub global_batch: usize,
}

/// Bytes per parameter / activation element (f32 training).
const ELEM_BYTES: u64 = 4;

/// Forward + backward cost relative to forward-only.
const TRAIN_FLOP_FACTOR: u64 = 3;

impl ModelSpec {
    /// Looks up a preset by its full benchmark name, e.g. `"gpt-1.3B"`.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "gpt-350M" => Some(Self::gpt_preset("350M", 24, 1024, 16)),
            "gpt-1.3B" => Some(Self::gpt_preset("1.3B", 24, 2048, 32)),
            "moe-380M" => Some(Self::moe_preset("380M", 12, 768, 12, 8)),
            "moe-1.3B" => Some(Self::moe_preset("1.3B", 16, 1024, 16, 16)),
            _ => None,
        }
    }

    /// Names of all built-in presets.
    pub fn preset_names() -> &'static [&'static str] {
        &["gpt-350M", "gpt-1.3B", "moe-380M", "moe-1.3B"]
    }

    fn gpt_preset(size: &str, layers: usize, hidden: usize, heads: usize) -> Self {
        Self {
            name: format!("gpt-{size}"),
            family: ModelFamily::DenseTransformer,
            num_layers: layers,
            hidden_size: hidden,
            num_attention_heads: heads,
            num_experts: None,
            vocab_size: 51_200,
            seq_len: 1024,
            global_batch: 1024,
        }
    }

    fn moe_preset(size: &str, layers: usize, hidden: usize, heads: usize, experts: usize) -> Self {
        Self {
            name: format!("moe-{size}"),
            family: ModelFamily::MixtureOfExperts,
            num_layers: layers,
            hidden_size: hidden,
            num_attention_heads: heads,
            num_experts: Some(experts),
            vocab_size: 51_200,
            seq_len: 1024,
            global_batch: 1024,
        }
    }

    /// Expands the spec into its ordered operator sequence.
    ///
    /// Each layer contributes an attention operator followed by a
    /// feed-forward operator. For MoE models, every second feed-forward
    /// block is a routed expert block (its parameters scale with the
    /// expert count; its per-token compute does not, top-1 routing).
    ///
    /// Deterministic: the same spec always yields the same sequence.
    pub fn operators(&self) -> Vec<OperatorDef> {
        let b = self.global_batch as u64;
        let s = self.seq_len as u64;
        let h = self.hidden_size as u64;
        let tokens = b * s;

        // Forward flops per token: attention 8h² for the projections plus
        // 4sh for the score/context matmuls; feed-forward 16h² for the
        // two 4× projections.
        let attn_flops = TRAIN_FLOP_FACTOR * tokens * (8 * h * h + 4 * s * h);
        let ffn_flops = TRAIN_FLOP_FACTOR * tokens * 16 * h * h;

        let attn_params = 4 * h * h * ELEM_BYTES;
        let ffn_params = 8 * h * h * ELEM_BYTES;
        let act_bytes = tokens * h * ELEM_BYTES;

        let mut ops = Vec::with_capacity(self.num_layers * 2);
        for layer in 0..self.num_layers {
            ops.push(OperatorDef {
                name: format!("layer.{layer}.attn"),
                kind: OpKind::Attention,
                layer,
                flops: attn_flops,
                param_bytes: attn_params,
                activation_bytes: act_bytes,
            });

            let is_moe = self.family == ModelFamily::MixtureOfExperts && layer % 2 == 1;
            if is_moe {
                let experts = self.num_experts.unwrap_or(1) as u64;
                ops.push(OperatorDef {
                    name: format!("layer.{layer}.moe"),
                    kind: OpKind::MoeFeedForward,
                    layer,
                    flops: ffn_flops,
                    param_bytes: ffn_params * experts,
                    activation_bytes: act_bytes,
                });
            } else {
                ops.push(OperatorDef {
                    name: format!("layer.{layer}.mlp"),
                    kind: OpKind::FeedForward,
                    layer,
                    flops: ffn_flops,
                    param_bytes: ffn_params,
                    activation_bytes: act_bytes,
                });
            }
        }
        ops
    }

    /// Total parameter bytes across all operators.
    pub fn total_param_bytes(&self) -> u64 {
        self.operators().iter().map(|op| op.param_bytes).sum()
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        let params_gb = self.total_param_bytes() as f64 / 1e9;
        format!(
            "Model '{}' ({}): {} layers, hidden {}, {} heads{}, {:.2} GB parameters",
            self.name,
            self.family,
            self.num_layers,
            self.hidden_size,
            self.num_attention_heads,
            match self.num_experts {
                Some(e) => format!(", {e} experts"),
                None => String::new(),
            },
            params_gb,
        )
    }
}
