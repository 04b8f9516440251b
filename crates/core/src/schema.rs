// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema identity and analyser input requirements
//!
//! A schema identifies a data shape by `(name, version)`. Two schemas are
//! compatible iff both fields are character-identical; the engine never
//! inspects message content against a schema definition.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing the textual `"name/version"` schema form
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid schema reference '{input}': expected 'name/version'")]
pub struct SchemaParseError {
    pub input: String,
}

/// A data-shape identity: `(name, version)`.
///
/// Serialises as the textual `"name/version"` form used in runbooks and
/// persisted messages.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Schema {
    pub name: String,
    pub version: String,
}

impl Schema {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The requirement satisfied exactly by this schema.
    pub fn as_requirement(&self) -> InputRequirement {
        InputRequirement {
            schema_name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl FromStr for Schema {
    type Err = SchemaParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Schema::new(name, version))
            }
            _ => Err(SchemaParseError {
                input: s.to_string(),
            }),
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single accepted input schema of an analyser.
///
/// Ordered and hashable so that requirement combinations compare as sets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputRequirement {
    pub schema_name: String,
    pub version: String,
}

impl InputRequirement {
    pub fn new(schema_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            version: version.into(),
        }
    }

    /// Exact `(name, version)` match against a concrete schema.
    pub fn matches(&self, schema: &Schema) -> bool {
        self.schema_name == schema.name && self.version == schema.version
    }
}

impl fmt::Display for InputRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.schema_name, self.version)
    }
}

impl From<&Schema> for InputRequirement {
    fn from(schema: &Schema) -> Self {
        schema.as_requirement()
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
