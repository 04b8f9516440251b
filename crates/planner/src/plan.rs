// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable execution plan

use crate::dag::ExecutionDag;
use dm_core::{ArtifactId, InputRequirement, Origin, Schema};
use dm_runbook::{ArtifactDefinition, Runbook};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Resolved schema information for one artifact.
///
/// `inputs` is the analyser requirement combination matched at plan time
/// (absent for sources, pass-throughs, and deferred reuse consumers).
/// `output` is absent only for reuse artifacts without an `output_schema`
/// override, whose schema is known at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSchema {
    pub inputs: Option<Vec<InputRequirement>>,
    pub output: Option<Schema>,
}

/// Compiled, validated form of a runbook. Read-only after planning.
#[derive(Debug)]
pub struct ExecutionPlan {
    runbook: Runbook,
    runbook_path: PathBuf,
    artifacts: BTreeMap<ArtifactId, ArtifactDefinition>,
    dag: ExecutionDag,
    schemas: BTreeMap<ArtifactId, ArtifactSchema>,
    aliases: BTreeMap<String, ArtifactId>,
    reversed_aliases: BTreeMap<ArtifactId, String>,
    origins: BTreeMap<ArtifactId, Origin>,
    redacted: BTreeSet<ArtifactId>,
}

impl ExecutionPlan {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        runbook: Runbook,
        runbook_path: PathBuf,
        artifacts: BTreeMap<ArtifactId, ArtifactDefinition>,
        dag: ExecutionDag,
        schemas: BTreeMap<ArtifactId, ArtifactSchema>,
        aliases: BTreeMap<String, ArtifactId>,
        origins: BTreeMap<ArtifactId, Origin>,
        redacted: BTreeSet<ArtifactId>,
    ) -> Self {
        let reversed_aliases = aliases
            .iter()
            .map(|(name, id)| (id.clone(), name.clone()))
            .collect();
        Self {
            runbook,
            runbook_path,
            artifacts,
            dag,
            schemas,
            aliases,
            reversed_aliases,
            origins,
            redacted,
        }
    }

    /// The parsed parent runbook the plan was compiled from.
    pub fn runbook(&self) -> &Runbook {
        &self.runbook
    }

    pub fn runbook_path(&self) -> &Path {
        &self.runbook_path
    }

    /// Flattened artifact definitions, keyed by namespaced id.
    pub fn artifacts(&self) -> &BTreeMap<ArtifactId, ArtifactDefinition> {
        &self.artifacts
    }

    pub fn artifact(&self, id: &ArtifactId) -> Option<&ArtifactDefinition> {
        self.artifacts.get(id)
    }

    pub fn ids(&self) -> BTreeSet<ArtifactId> {
        self.artifacts.keys().cloned().collect()
    }

    pub fn dag(&self) -> &ExecutionDag {
        &self.dag
    }

    pub fn schema(&self, id: &ArtifactId) -> Option<&ArtifactSchema> {
        self.schemas.get(id)
    }

    /// parent artifact name -> namespaced child artifact id
    pub fn aliases(&self) -> &BTreeMap<String, ArtifactId> {
        &self.aliases
    }

    /// namespaced child artifact id -> parent artifact name
    pub fn reversed_aliases(&self) -> &BTreeMap<ArtifactId, String> {
        &self.reversed_aliases
    }

    pub fn alias_of(&self, id: &ArtifactId) -> Option<&str> {
        self.reversed_aliases.get(id).map(|name| name.as_str())
    }

    pub fn origin(&self, id: &ArtifactId) -> Origin {
        self.origins.get(id).cloned().unwrap_or(Origin::Parent)
    }

    /// Whether this artifact's content must be redacted in logs and
    /// exported results (sensitive child input).
    pub fn is_redacted(&self, id: &ArtifactId) -> bool {
        self.redacted.contains(id)
    }

    pub fn max_concurrency(&self) -> usize {
        self.runbook.config.max_concurrency
    }

    /// Run timeout from the runbook config, if any.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.runbook
            .config
            .timeout
            .map(std::time::Duration::from_secs)
    }
}
