// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact store: run-scoped persisted mapping from artifact id to message
//!
//! Layout on disk:
//!
//! ```text
//! <base>/runs/<run_id>/
//!   _system/
//!     run.json        # RunMetadata
//!     state.json      # ExecutionState
//!   <artifact_id>     # one JSON file per artifact message
//! ```
//!
//! Artifact ids are filename-safe by construction (the parser restricts
//! the charset and namespacing only adds `__` separators), so keys map to
//! file names directly. Saves are atomic per key; runs are isolated by id.

use crate::error::StorageError;
use crate::fsio::{is_tmp_name, write_atomic};
use crate::meta::RunMetadata;
use crate::state::ExecutionState;
use dm_core::{Message, RunId};
use std::path::{Path, PathBuf};

const SYSTEM_DIR: &str = "_system";
const RUN_FILE: &str = "run.json";
const STATE_FILE: &str = "state.json";

/// Run-scoped key/value store for messages
pub trait ArtifactStore: Send + Sync {
    /// Write or overwrite; atomic per key.
    fn save(&self, run_id: &RunId, key: &str, message: &Message) -> Result<(), StorageError>;

    fn get(&self, run_id: &RunId, key: &str) -> Result<Message, StorageError>;

    fn exists(&self, run_id: &RunId, key: &str) -> Result<bool, StorageError>;

    fn delete(&self, run_id: &RunId, key: &str) -> Result<(), StorageError>;

    /// Keys for the run with the given prefix, sorted.
    fn list_keys(&self, run_id: &RunId, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Remove every key and the run's metadata and state.
    fn clear(&self, run_id: &RunId) -> Result<(), StorageError>;
}

/// Persistence for run metadata and execution state
pub trait RunStateStore: Send + Sync {
    fn save_metadata(&self, metadata: &RunMetadata) -> Result<(), StorageError>;
    fn load_metadata(&self, run_id: &RunId) -> Result<Option<RunMetadata>, StorageError>;
    fn save_state(&self, run_id: &RunId, state: &ExecutionState) -> Result<(), StorageError>;
    fn load_state(&self, run_id: &RunId) -> Result<Option<ExecutionState>, StorageError>;
}

/// Filesystem-backed store
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    base: PathBuf,
}

impl FsArtifactStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.base.join("runs").join(run_id.as_str())
    }

    fn artifact_path(&self, run_id: &RunId, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.run_dir(run_id).join(key))
    }

    fn system_path(&self, run_id: &RunId, file: &str) -> PathBuf {
        self.run_dir(run_id).join(SYSTEM_DIR).join(file)
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        path: &Path,
    ) -> Result<Option<T>, StorageError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = |message: &str| StorageError::InvalidKey {
        key: key.to_string(),
        message: message.to_string(),
    };
    if key.is_empty() {
        return Err(invalid("key must not be empty"));
    }
    if key.starts_with('_') || key.starts_with('.') {
        return Err(invalid("key must not start with '_' or '.'"));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(invalid("key must not contain path separators"));
    }
    Ok(())
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, run_id: &RunId, key: &str, message: &Message) -> Result<(), StorageError> {
        let path = self.artifact_path(run_id, key)?;
        let bytes = serde_json::to_vec_pretty(message)?;
        write_atomic(&path, &bytes)?;
        Ok(())
    }

    fn get(&self, run_id: &RunId, key: &str) -> Result<Message, StorageError> {
        let path = self.artifact_path(run_id, key)?;
        Self::read_json(&path)?.ok_or_else(|| StorageError::NotFound {
            run_id: run_id.to_string(),
            key: key.to_string(),
        })
    }

    fn exists(&self, run_id: &RunId, key: &str) -> Result<bool, StorageError> {
        Ok(self.artifact_path(run_id, key)?.is_file())
    }

    fn delete(&self, run_id: &RunId, key: &str) -> Result<(), StorageError> {
        let path = self.artifact_path(run_id, key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound {
                    run_id: run_id.to_string(),
                    key: key.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn list_keys(&self, run_id: &RunId, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.run_dir(run_id);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('_') || is_tmp_name(&name) {
                continue;
            }
            if name.starts_with(prefix) {
                keys.push(name);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    fn clear(&self, run_id: &RunId) -> Result<(), StorageError> {
        let dir = self.run_dir(run_id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl RunStateStore for FsArtifactStore {
    fn save_metadata(&self, metadata: &RunMetadata) -> Result<(), StorageError> {
        let path = self.system_path(&metadata.run_id, RUN_FILE);
        let bytes = serde_json::to_vec_pretty(metadata)?;
        write_atomic(&path, &bytes)?;
        Ok(())
    }

    fn load_metadata(&self, run_id: &RunId) -> Result<Option<RunMetadata>, StorageError> {
        Self::read_json(&self.system_path(run_id, RUN_FILE))
    }

    fn save_state(&self, run_id: &RunId, state: &ExecutionState) -> Result<(), StorageError> {
        let path = self.system_path(run_id, STATE_FILE);
        let bytes = serde_json::to_vec_pretty(state)?;
        write_atomic(&path, &bytes)?;
        Ok(())
    }

    fn load_state(&self, run_id: &RunId) -> Result<Option<ExecutionState>, StorageError> {
        Self::read_json(&self.system_path(run_id, STATE_FILE))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
