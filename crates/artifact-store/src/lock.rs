// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Advisory per-key lock files.
//!
//! Training and persisting a predictor for one key is a serialized
//! operation: two runs writing the same key concurrently would corrupt
//! the record pair. [`StoreLock`] is an RAII guard over a lock file
//! created with `create_new`; dropping the guard removes the file.
//!
//! The lock is advisory. It guards cooperating planlat processes, not
//! arbitrary writers.

use crate::StoreError;
use std::io::Write;
use std::path::PathBuf;

/// RAII guard holding the advisory lock for one artifact key.
///
/// The lock file is removed when the guard drops, including on unwind.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Acquires the lock at `path`, failing with
    /// [`StoreError::LockHeld`] if another holder exists.
    pub(crate) fn acquire(path: PathBuf, key: &str) -> Result<Self, StoreError> {
        let result = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path);
        match result {
            Ok(mut file) => {
                // Record the holder for post-mortem debugging of stale locks.
                let _ = writeln!(file, "pid {}", std::process::id());
                tracing::debug!("acquired lock {}", path.display());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::LockHeld { key: key.to_string() })
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("failed to remove lock {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_excludes_second_holder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.lock");

        let first = StoreLock::acquire(path.clone(), "k").unwrap();
        assert!(matches!(
            StoreLock::acquire(path.clone(), "k"),
            Err(StoreError::LockHeld { .. })
        ));

        drop(first);
        // Released: can be re-acquired.
        StoreLock::acquire(path, "k").unwrap();
    }

    #[test]
    fn test_lock_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.lock");
        {
            let _lock = StoreLock::acquire(path.clone(), "k").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
