// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan-time error taxonomy
//!
//! Every variant is fatal: the planner surfaces the first failure and the
//! executor is never invoked on an invalid plan.

use dm_runbook::ParseError;
use thiserror::Error;

/// Errors that can occur while compiling a runbook into an execution plan
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cycle detected among artifacts: {}", cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    #[error("artifact '{referrer}' references unknown artifact '{id}'")]
    MissingArtifact { id: String, referrer: String },

    #[error("unknown {kind} type '{name}'; available: {available}")]
    ComponentNotFound {
        kind: &'static str,
        name: String,
        available: String,
    },

    #[error(
        "no accepted input combination of analyser '{analyser}' matches the schemas \
         provided to '{artifact}': provided {{{provided}}}; accepted: {available}"
    )]
    SchemaCompatibility {
        artifact: String,
        analyser: String,
        provided: String,
        available: String,
    },

    #[error("analyser '{name}' declares no output schemas")]
    NoDeclaredOutput { name: String },

    #[error("pass-through artifact '{artifact}' mixes input schemas: {found}")]
    MixedSchemas { artifact: String, found: String },

    #[error("child runbook path '{path}' must be relative and must not contain '..'")]
    InvalidPath { path: String },

    #[error("child runbook '{path}' not found (searched: {searched})")]
    ChildRunbookNotFound { path: String, searched: String },

    #[error("circular child-runbook reference: {}", cycle.join(" -> "))]
    CircularRunbook { cycle: Vec<String> },

    #[error(
        "artifact '{artifact}' does not map required inputs of child runbook '{child}': {}",
        missing.join(", ")
    )]
    MissingInputMapping {
        artifact: String,
        child: String,
        missing: Vec<String>,
    },

    #[error(
        "artifact '{artifact}' maps unknown input '{input}' of child runbook '{child}'; \
         declared inputs: {declared}"
    )]
    UnknownChildInput {
        artifact: String,
        child: String,
        input: String,
        declared: String,
    },

    #[error(
        "artifact '{artifact}' selects unknown output '{output}' of child runbook '{child}'; \
         declared outputs: {declared}"
    )]
    UnknownChildOutput {
        artifact: String,
        child: String,
        output: String,
        declared: String,
    },

    #[error(
        "child input '{input}' of '{child}' declares {declared} but mapped artifact \
         '{bound}' produces {found}"
    )]
    InputSchemaMismatch {
        child: String,
        input: String,
        declared: String,
        bound: String,
        found: String,
    },
}
