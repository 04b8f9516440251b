// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregated run outcome for reporting

use chrono::{DateTime, Utc};
use dm_core::{ArtifactId, Origin, RunId};
use dm_planner::ExecutionPlan;
use dm_storage::{ArtifactStore, RunStatus, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Terminal outcome of one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Completed,
    Failed,
    Skipped,
}

/// Per-artifact outcome, timing, and labelling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactResult {
    pub status: ArtifactStatus,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub output: bool,
    pub optional: bool,
}

/// The result of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: RunId,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Outcomes for every artifact that reached a terminal state. On a
    /// timed-out run, never-started artifacts are absent.
    pub artifacts: BTreeMap<ArtifactId, ArtifactResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    fn with_status(&self, status: ArtifactStatus) -> Vec<&ArtifactId> {
        self.artifacts
            .iter()
            .filter(|(_, result)| result.status == status)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn completed(&self) -> Vec<&ArtifactId> {
        self.with_status(ArtifactStatus::Completed)
    }

    pub fn failed(&self) -> Vec<&ArtifactId> {
        self.with_status(ArtifactStatus::Failed)
    }

    pub fn skipped(&self) -> Vec<&ArtifactId> {
        self.with_status(ArtifactStatus::Skipped)
    }

    /// Contents of completed `output: true` artifacts, keyed by alias when
    /// one exists, else by id. Redacted artifacts export `"[REDACTED]"`.
    pub fn export_outputs<S: ArtifactStore + ?Sized>(
        &self,
        plan: &ExecutionPlan,
        store: &S,
    ) -> Result<BTreeMap<String, Value>, StorageError> {
        let mut outputs = BTreeMap::new();
        for (id, result) in &self.artifacts {
            if !result.output || result.status != ArtifactStatus::Completed {
                continue;
            }
            let name = result
                .alias
                .clone()
                .unwrap_or_else(|| id.to_string());
            let value = if plan.is_redacted(id) {
                Value::String("[REDACTED]".to_string())
            } else {
                store.get(&self.run_id, id.as_str())?.content
            };
            outputs.insert(name, value);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(statuses: &[(&str, ArtifactStatus)]) -> ExecutionResult {
        let artifacts = statuses
            .iter()
            .map(|(id, status)| {
                (
                    ArtifactId::new(*id),
                    ArtifactResult {
                        status: *status,
                        origin: Origin::Parent,
                        alias: None,
                        error: None,
                        duration_seconds: None,
                        output: false,
                        optional: false,
                    },
                )
            })
            .collect();
        ExecutionResult {
            run_id: RunId::new("r1"),
            status: RunStatus::Completed,
            reason: None,
            artifacts,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn status_accessors_partition_artifacts() {
        let result = result_with(&[
            ("a", ArtifactStatus::Completed),
            ("b", ArtifactStatus::Failed),
            ("c", ArtifactStatus::Skipped),
            ("d", ArtifactStatus::Completed),
        ]);
        assert_eq!(result.completed().len(), 2);
        assert_eq!(result.failed(), vec![&ArtifactId::new("b")]);
        assert_eq!(result.skipped(), vec![&ArtifactId::new("c")]);
        assert!(result.is_success());
    }

    #[test]
    fn roundtrips_through_json() {
        let result = result_with(&[("a", ArtifactStatus::Completed)]);
        let text = serde_json::to_string(&result).unwrap();
        let back: ExecutionResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }
}
