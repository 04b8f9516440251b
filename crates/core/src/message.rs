// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages carried between connectors, analysers, and the artifact store
//!
//! Message content is opaque to the engine; only components interpret it.
//! The executor attaches an [`ExecutionContext`] extension to each message
//! it stores.

use crate::schema::Schema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome status recorded on a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Success,
    Error,
}

/// Where an artifact originated: the parent runbook or a flattened child.
///
/// Serialises textually as `"parent"` or `"child:<runbook_name>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Parent,
    Child(String),
}

impl Origin {
    pub fn is_parent(&self) -> bool {
        matches!(self, Origin::Parent)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Parent => f.write_str("parent"),
            Origin::Child(name) => write!(f, "child:{}", name),
        }
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "parent" {
            Ok(Origin::Parent)
        } else if let Some(name) = s.strip_prefix("child:") {
            if name.is_empty() {
                Err(serde::de::Error::custom("empty child runbook name"))
            } else {
                Ok(Origin::Child(name.to_string()))
            }
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid origin '{}': expected 'parent' or 'child:<name>'",
                s
            )))
        }
    }
}

/// Execution record the engine attaches to every stored message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub status: ExecutionStatus,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl ExecutionContext {
    /// A successful context with the given origin; alias and timing are
    /// filled in by the executor.
    pub fn success(origin: Origin) -> Self {
        Self {
            status: ExecutionStatus::Success,
            origin,
            alias: None,
            error: None,
            duration_seconds: None,
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// Extension records carried alongside message content.
///
/// `execution` is engine-owned; anything else round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionContext>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A schema-tagged data value produced by a connector or analyser.
///
/// Immutable after creation by its producer, except that the executor
/// attaches an updated `extensions.execution` on the copy it stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: Value,
    pub schema: Schema,
    #[serde(default)]
    pub extensions: Extensions,
}

impl Message {
    pub fn new(id: impl Into<String>, content: Value, schema: Schema) -> Self {
        Self {
            id: id.into(),
            content,
            schema,
            extensions: Extensions::default(),
        }
    }

    /// Copy of this message with the given execution context attached.
    pub fn with_execution(mut self, execution: ExecutionContext) -> Self {
        self.extensions.execution = Some(execution);
        self
    }

    pub fn execution(&self) -> Option<&ExecutionContext> {
        self.extensions.execution.as_ref()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
