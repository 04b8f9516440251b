// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error types

use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: '{key}' in run {run_id}")]
    NotFound { run_id: String, key: String },

    #[error("invalid store key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    #[error("corrupt state for run {run_id}: {message}")]
    Corrupt { run_id: String, message: String },
}
