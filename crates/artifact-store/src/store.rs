// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Filesystem-backed artifact store.
//!
//! One artifact is a record pair under the store root:
//! - `<stem>.safetensors` — the predictor's parameter tensors.
//! - `<stem>.json` — metadata: benchmark identity, cluster signature,
//!   feature schema version, model dimensions, and the latency
//!   normalization constants.
//!
//! Loading checks the metadata against the key *before* touching the
//! weights: an incompatible feature schema is an explicit
//! [`StoreError::SchemaMismatch`], never a silently mis-predicting
//! model. Saving refuses to clobber an existing record unless the
//! caller passes `overwrite`.

use crate::{ArtifactKey, StoreError, StoreLock};
use cost_model::{LatencyModel, ModelConfig, Normalization};
use graph_encode::FEATURE_WIDTH;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Metadata sidecar stored next to the weight record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArtifactMetadata {
    /// Benchmark the predictor was trained for.
    pub benchmark: String,
    /// Cluster signature the training measurements came from.
    pub cluster: String,
    /// Feature schema version of the training encodings.
    pub schema_version: u32,
    /// Model dimensions.
    pub model: ModelConfig,
    /// Latency normalization constants.
    pub normalization: Normalization,
}

/// A directory of persisted predictors, keyed by [`ArtifactKey`].
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens a store rooted at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn weights_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{}.safetensors", key.file_stem()))
    }

    fn metadata_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{}.json", key.file_stem()))
    }

    fn lock_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(format!("{}.lock", key.file_stem()))
    }

    /// True if a complete record pair exists for `key`.
    pub fn exists(&self, key: &ArtifactKey) -> bool {
        self.weights_path(key).exists() && self.metadata_path(key).exists()
    }

    /// Acquires the advisory training lock for `key`.
    pub fn lock(&self, key: &ArtifactKey) -> Result<StoreLock, StoreError> {
        StoreLock::acquire(self.lock_path(key), &key.to_string())
    }

    /// Persists `model` under `key`.
    ///
    /// # Errors
    /// - [`StoreError::DestinationConflict`] if a record exists and
    ///   `overwrite` is false.
    /// - [`StoreError::SchemaMismatch`] if the model was built for a
    ///   different feature schema than the key claims.
    pub fn save(
        &self,
        key: &ArtifactKey,
        model: &LatencyModel,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        if model.config().schema_version != key.schema_version {
            return Err(StoreError::SchemaMismatch {
                key: key.to_string(),
                expected: format!("schema v{}", key.schema_version),
                actual: format!("model built for schema v{}", model.config().schema_version),
            });
        }

        let weights_path = self.weights_path(key);
        if self.exists(key) && !overwrite {
            return Err(StoreError::DestinationConflict { path: weights_path });
        }

        let metadata = ArtifactMetadata {
            benchmark: key.benchmark.clone(),
            cluster: key.cluster.clone(),
            schema_version: key.schema_version,
            model: model.config().clone(),
            normalization: model.normalization(),
        };
        let json = serde_json::to_string_pretty(&metadata)?;
        std::fs::write(self.metadata_path(key), json)?;

        let views: Vec<(String, safetensors::tensor::TensorView<'_>)> = model
            .tensor_views()
            .into_iter()
            .map(|(name, shape, data)| {
                let bytes = f32_bytes(data);
                safetensors::tensor::TensorView::new(safetensors::Dtype::F32, shape, bytes)
                    .map(|view| (name.to_string(), view))
                    .map_err(|e| StoreError::Weights(format!("tensor '{name}': {e}")))
            })
            .collect::<Result<_, _>>()?;
        let serialized = safetensors::serialize(views, &None)
            .map_err(|e| StoreError::Weights(format!("serialize failed: {e}")))?;
        std::fs::write(&weights_path, serialized)?;

        tracing::info!("saved artifact {} ({})", key, weights_path.display());
        Ok(())
    }

    /// Loads the predictor stored under `key`.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if no record pair exists.
    /// - [`StoreError::SchemaMismatch`] if the stored schema version or
    ///   feature width is incompatible with the current encoder. The
    ///   weights are not read in that case.
    pub fn load(&self, key: &ArtifactKey) -> Result<LatencyModel, StoreError> {
        if !self.exists(key) {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }

        let metadata: ArtifactMetadata =
            serde_json::from_str(&std::fs::read_to_string(self.metadata_path(key))?)?;

        if metadata.schema_version != key.schema_version {
            return Err(StoreError::SchemaMismatch {
                key: key.to_string(),
                expected: format!("schema v{}", key.schema_version),
                actual: format!("schema v{}", metadata.schema_version),
            });
        }
        if metadata.model.feature_width != FEATURE_WIDTH {
            return Err(StoreError::SchemaMismatch {
                key: key.to_string(),
                expected: format!("feature width {FEATURE_WIDTH}"),
                actual: format!("feature width {}", metadata.model.feature_width),
            });
        }

        let file = std::fs::File::open(self.weights_path(key))?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| StoreError::Weights(format!("mmap failed: {e}")))?;
        let tensors = safetensors::SafeTensors::deserialize(&mmap)
            .map_err(|e| StoreError::Weights(format!("parse failed: {e}")))?;

        let mut restored: HashMap<String, (Vec<usize>, Vec<f32>)> = HashMap::new();
        for (name, view) in tensors.tensors() {
            if view.dtype() != safetensors::Dtype::F32 {
                return Err(StoreError::Weights(format!(
                    "tensor '{name}' has dtype {:?}, expected F32",
                    view.dtype()
                )));
            }
            let values: Vec<f32> = view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            restored.insert(name.to_string(), (view.shape().to_vec(), values));
        }

        let model =
            LatencyModel::from_tensors(metadata.model, metadata.normalization, restored)?;
        tracing::info!("loaded artifact {key}");
        Ok(model)
    }

    /// Removes the record pair for `key`.
    pub fn remove(&self, key: &ArtifactKey) -> Result<(), StoreError> {
        if !self.exists(key) {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        std::fs::remove_file(self.weights_path(key))?;
        std::fs::remove_file(self.metadata_path(key))?;
        Ok(())
    }

    /// Metadata of every artifact in the store, in filename order.
    pub fn list(&self) -> Result<Vec<ArtifactMetadata>, StoreError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            out.push(serde_json::from_str(&std::fs::read_to_string(path)?)?);
        }
        Ok(out)
    }
}

/// Reinterprets an f32 slice as little-endian bytes.
fn f32_bytes(data: &[f32]) -> &[u8] {
    // SAFETY: f32 and u8 have no invalid bit patterns and the length is
    // scaled by the element size.
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * 4) }
}
