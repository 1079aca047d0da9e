// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for artifact persistence.

use std::path::PathBuf;

/// Errors raised while saving, loading, or locking artifacts.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No artifact exists under the requested key.
    #[error("no artifact found for key '{key}'")]
    NotFound { key: String },

    /// An artifact already exists and overwrite was not requested.
    #[error("artifact already exists at '{path}'; pass overwrite to replace it")]
    DestinationConflict { path: PathBuf },

    /// The stored artifact's feature schema is incompatible with the
    /// current encoder. Retrain instead of loading.
    #[error("schema mismatch for key '{key}': store has {actual}, expected {expected}")]
    SchemaMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// Another process holds the advisory lock for this key.
    #[error("artifact key '{key}' is locked by another training run")]
    LockHeld { key: String },

    /// Filesystem error.
    #[error("artifact store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata (de)serialisation error.
    #[error("artifact metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Weight record (de)serialisation error.
    #[error("artifact weight record error: {0}")]
    Weights(String),

    /// The restored parameters do not form a valid model.
    #[error("artifact model error: {0}")]
    Model(#[from] cost_model::ModelError),
}
