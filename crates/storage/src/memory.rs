// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for deterministic tests
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::error::StorageError;
use crate::meta::RunMetadata;
use crate::state::ExecutionState;
use crate::store::{ArtifactStore, RunStateStore};
use dm_core::{Message, RunId};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
struct MemoryInner {
    messages: BTreeMap<(String, String), Message>,
    metadata: BTreeMap<String, RunMetadata>,
    states: BTreeMap<String, ExecutionState>,
}

/// Process-local store with the same semantics as [`crate::FsArtifactStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages across all runs.
    pub fn message_count(&self) -> usize {
        self.inner.lock().messages.len()
    }
}

impl ArtifactStore for MemoryStore {
    fn save(&self, run_id: &RunId, key: &str, message: &Message) -> Result<(), StorageError> {
        self.inner
            .lock()
            .messages
            .insert((run_id.to_string(), key.to_string()), message.clone());
        Ok(())
    }

    fn get(&self, run_id: &RunId, key: &str) -> Result<Message, StorageError> {
        self.inner
            .lock()
            .messages
            .get(&(run_id.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                run_id: run_id.to_string(),
                key: key.to_string(),
            })
    }

    fn exists(&self, run_id: &RunId, key: &str) -> Result<bool, StorageError> {
        Ok(self
            .inner
            .lock()
            .messages
            .contains_key(&(run_id.to_string(), key.to_string())))
    }

    fn delete(&self, run_id: &RunId, key: &str) -> Result<(), StorageError> {
        self.inner
            .lock()
            .messages
            .remove(&(run_id.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                run_id: run_id.to_string(),
                key: key.to_string(),
            })
    }

    fn list_keys(&self, run_id: &RunId, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .inner
            .lock()
            .messages
            .keys()
            .filter(|(run, key)| run == run_id.as_str() && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn clear(&self, run_id: &RunId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.messages.retain(|(run, _), _| run != run_id.as_str());
        inner.metadata.remove(run_id.as_str());
        inner.states.remove(run_id.as_str());
        Ok(())
    }
}

impl RunStateStore for MemoryStore {
    fn save_metadata(&self, metadata: &RunMetadata) -> Result<(), StorageError> {
        self.inner
            .lock()
            .metadata
            .insert(metadata.run_id.to_string(), metadata.clone());
        Ok(())
    }

    fn load_metadata(&self, run_id: &RunId) -> Result<Option<RunMetadata>, StorageError> {
        Ok(self.inner.lock().metadata.get(run_id.as_str()).cloned())
    }

    fn save_state(&self, run_id: &RunId, state: &ExecutionState) -> Result<(), StorageError> {
        self.inner
            .lock()
            .states
            .insert(run_id.to_string(), state.clone());
        Ok(())
    }

    fn load_state(&self, run_id: &RunId) -> Result<Option<ExecutionState>, StorageError> {
        Ok(self.inner.lock().states.get(run_id.as_str()).cloned())
    }
}
