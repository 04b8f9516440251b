// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-level error types
//!
//! Component failures are never surfaced here: they are contained at
//! artifact granularity and reported through the execution result.

use dm_core::RunId;
use dm_storage::StorageError;
use thiserror::Error;

/// Errors that abort a run before or outside artifact production
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("run {0} not found for resume")]
    RunNotFound(RunId),

    #[error("run {0} is still marked running (concurrent run?)")]
    RunActive(RunId),

    #[error("runbook changed since run {run_id} (hash mismatch); restart or re-plan")]
    RunbookChanged { run_id: RunId },

    #[error("run {run_id} has no execution state to resume")]
    StateMissing { run_id: RunId },

    #[error("invalid execution state for run {run_id}: {message}")]
    StateInvalid { run_id: RunId, message: String },

    #[error("worker task failed: {0}")]
    Join(String),
}
