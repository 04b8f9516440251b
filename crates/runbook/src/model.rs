// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed runbook model
//!
//! An artifact's production method is a sum type: exactly one of `source`,
//! `inputs`, or `reuse`. The parser enforces the exclusivity when building
//! the model from the raw YAML fields; serialisation maps the variant back
//! onto the corresponding field so a parsed runbook round-trips.

use dm_core::{Properties, Schema};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Connector invocation: `source: { type, properties }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(rename = "type")]
    pub connector: String,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

/// Analyser invocation: `process: { type, properties }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessConfig {
    #[serde(rename = "type")]
    pub analyser: String,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

/// Cross-run artifact reuse: `reuse: { from_run, artifact }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReuseConfig {
    pub from_run: String,
    pub artifact: String,
}

/// Child-runbook invocation, flattened away at plan time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChildRunbookConfig {
    /// Relative path, no `..` segments; resolved against the parent
    /// runbook directory then `config.template_paths`.
    pub path: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub input_mapping: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_mapping: Option<IndexMap<String, String>>,
}

/// Merge strategy for same-schema fan-in (fixed in Phase 1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    #[default]
    Concatenate,
}

/// How an artifact is produced: exactly one of the three.
#[derive(Debug, Clone, PartialEq)]
pub enum Production {
    Source(SourceConfig),
    Inputs(Vec<String>),
    Reuse(ReuseConfig),
}

impl Production {
    /// Upstream artifact ids, in declared order (empty for source/reuse).
    pub fn inputs(&self) -> &[String] {
        match self {
            Production::Inputs(ids) => ids,
            _ => &[],
        }
    }
}

/// The unit of work: one named artifact definition
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDefinition {
    pub name: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub production: Production,
    pub process: Option<ProcessConfig>,
    pub child_runbook: Option<ChildRunbookConfig>,
    pub merge: MergeStrategy,
    pub output_schema: Option<Schema>,
    pub output: bool,
    pub optional: bool,
}

impl ArtifactDefinition {
    /// A bare source artifact (used by tests and the flattener when it
    /// synthesizes defaults for unmapped optional child inputs).
    pub fn source(connector: &str, properties: Properties) -> Self {
        Self::with_production(Production::Source(SourceConfig {
            connector: connector.to_string(),
            properties,
        }))
    }

    /// A bare derived artifact with the given upstream ids.
    pub fn derived(inputs: Vec<String>) -> Self {
        Self::with_production(Production::Inputs(inputs))
    }

    fn with_production(production: Production) -> Self {
        Self {
            name: None,
            description: None,
            contact: None,
            production,
            process: None,
            child_runbook: None,
            merge: MergeStrategy::Concatenate,
            output_schema: None,
            output: false,
            optional: false,
        }
    }

    pub fn inputs(&self) -> &[String] {
        self.production.inputs()
    }

    pub fn is_source(&self) -> bool {
        matches!(self.production, Production::Source(_))
    }

    pub fn is_reuse(&self) -> bool {
        matches!(self.production, Production::Reuse(_))
    }
}

impl Serialize for ArtifactDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(ref name) = self.name {
            map.serialize_entry("name", name)?;
        }
        if let Some(ref description) = self.description {
            map.serialize_entry("description", description)?;
        }
        if let Some(ref contact) = self.contact {
            map.serialize_entry("contact", contact)?;
        }
        match &self.production {
            Production::Source(source) => map.serialize_entry("source", source)?,
            Production::Inputs(inputs) => map.serialize_entry("inputs", inputs)?,
            Production::Reuse(reuse) => map.serialize_entry("reuse", reuse)?,
        }
        if let Some(ref process) = self.process {
            map.serialize_entry("process", process)?;
        }
        if let Some(ref child) = self.child_runbook {
            map.serialize_entry("child_runbook", child)?;
        }
        if let Some(ref schema) = self.output_schema {
            map.serialize_entry("output_schema", schema)?;
        }
        if self.output {
            map.serialize_entry("output", &true)?;
        }
        if self.optional {
            map.serialize_entry("optional", &true)?;
        }
        map.end()
    }
}

/// Runbook-level execution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunbookConfig {
    /// Run timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Carried for LLM-backed analysers; not enforced by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_limit: Option<f64>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Extra search roots for child runbooks, relative to the parent
    /// runbook directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_paths: Vec<String>,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for RunbookConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            cost_limit: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            template_paths: Vec::new(),
        }
    }
}

/// A declared input making the runbook usable as a child module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDeclaration {
    pub input_schema: Schema,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A declared output exposed to parent runbooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputDeclaration {
    pub artifact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A parsed runbook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Runbook {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub config: RunbookConfig,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, InputDeclaration>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, OutputDeclaration>,
    pub artifacts: IndexMap<String, ArtifactDefinition>,
}

impl Runbook {
    /// Whether this runbook declares top-level inputs (usable as a child).
    pub fn is_child_module(&self) -> bool {
        !self.inputs.is_empty()
    }

    pub fn get_artifact(&self, id: &str) -> Option<&ArtifactDefinition> {
        self.artifacts.get(id)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
