// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run metadata, written once at run start and once at run end

use chrono::{DateTime, Utc};
use dm_core::RunId;
use serde::{Deserialize, Serialize};

/// Run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Metadata persisted as `_system/run.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: RunId,
    pub runbook_path: String,
    /// Hash of the canonicalised parent runbook. Child runbooks are
    /// intentionally not hashed; editing one between runs is not detected
    /// on resume.
    pub runbook_hash: String,
    pub start_time: DateTime<Utc>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Failure reason (e.g. "timeout") when status is failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RunMetadata {
    /// Fresh metadata for a run that is starting now.
    pub fn started(run_id: RunId, runbook_path: String, runbook_hash: String) -> Self {
        Self {
            run_id,
            runbook_path,
            runbook_hash,
            start_time: Utc::now(),
            status: RunStatus::Running,
            end_time: None,
            reason: None,
        }
    }

    /// Close the run with a terminal status.
    pub fn finish(&mut self, status: RunStatus, reason: Option<String>) {
        self.status = status;
        self.reason = reason;
        self.end_time = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_metadata_is_running() {
        let meta = RunMetadata::started(RunId::new("r1"), "audit.yaml".into(), "abc".into());
        assert_eq!(meta.status, RunStatus::Running);
        assert!(meta.end_time.is_none());
    }

    #[test]
    fn finish_records_status_and_end_time() {
        let mut meta = RunMetadata::started(RunId::new("r1"), "audit.yaml".into(), "abc".into());
        meta.finish(RunStatus::Failed, Some("timeout".into()));
        assert_eq!(meta.status, RunStatus::Failed);
        assert_eq!(meta.reason.as_deref(), Some("timeout"));
        assert!(meta.end_time.is_some());
    }

    #[test]
    fn roundtrips_through_json() {
        let mut meta = RunMetadata::started(RunId::new("r1"), "audit.yaml".into(), "abc".into());
        meta.finish(RunStatus::Completed, None);
        let text = serde_json::to_string(&meta).unwrap();
        let back: RunMetadata = serde_json::from_str(&text).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Running).unwrap(),
            "\"running\""
        );
    }
}
