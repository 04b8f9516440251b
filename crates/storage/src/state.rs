// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run execution state, checkpointed after every artifact outcome
//!
//! The four sets partition the plan's artifact ids. The last successful
//! write is authoritative on resume.

use chrono::{DateTime, Utc};
use dm_core::ArtifactId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Checkpointed artifact outcome sets, persisted as `_system/state.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub completed: BTreeSet<ArtifactId>,
    pub not_started: BTreeSet<ArtifactId>,
    pub failed: BTreeSet<ArtifactId>,
    pub skipped: BTreeSet<ArtifactId>,
    pub last_checkpoint: DateTime<Utc>,
}

impl ExecutionState {
    /// Fresh state: every id not started.
    pub fn new(ids: impl IntoIterator<Item = ArtifactId>) -> Self {
        Self {
            completed: BTreeSet::new(),
            not_started: ids.into_iter().collect(),
            failed: BTreeSet::new(),
            skipped: BTreeSet::new(),
            last_checkpoint: Utc::now(),
        }
    }

    pub fn mark_completed(&mut self, id: &ArtifactId) {
        self.not_started.remove(id);
        self.completed.insert(id.clone());
        self.touch();
    }

    pub fn mark_failed(&mut self, id: &ArtifactId) {
        self.not_started.remove(id);
        self.failed.insert(id.clone());
        self.touch();
    }

    /// Skip an id if it has not already been decided. Returns whether the
    /// id moved into the skipped set.
    pub fn mark_skipped(&mut self, id: &ArtifactId) -> bool {
        if self.not_started.remove(id) {
            self.skipped.insert(id.clone());
            self.touch();
            true
        } else {
            false
        }
    }

    /// Whether the id has a terminal outcome (anything but not-started).
    pub fn is_decided(&self, id: &ArtifactId) -> bool {
        !self.not_started.contains(id)
    }

    /// Resume invariant: the sets are pairwise disjoint and their union
    /// equals the plan's artifact-id set.
    pub fn validate_against(&self, ids: &BTreeSet<ArtifactId>) -> Result<(), String> {
        let sets = [
            ("completed", &self.completed),
            ("not_started", &self.not_started),
            ("failed", &self.failed),
            ("skipped", &self.skipped),
        ];
        for (i, (name_a, set_a)) in sets.iter().enumerate() {
            for (name_b, set_b) in sets.iter().skip(i + 1) {
                if let Some(id) = set_a.intersection(set_b).next() {
                    return Err(format!(
                        "'{}' appears in both {} and {}",
                        id, name_a, name_b
                    ));
                }
            }
        }

        let union: BTreeSet<&ArtifactId> = sets.iter().flat_map(|(_, set)| set.iter()).collect();
        if let Some(extra) = union.iter().find(|id| !ids.contains(**id)) {
            return Err(format!("'{}' is not an artifact of this plan", extra));
        }
        if let Some(missing) = ids.iter().find(|id| !union.contains(id)) {
            return Err(format!("'{}' is missing from the recorded state", missing));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.last_checkpoint = Utc::now();
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
