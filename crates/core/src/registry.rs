// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component registry and connector/analyser contracts
//!
//! Connectors produce initial artifacts from external systems; analysers
//! derive artifacts from upstream messages. Both are registered by the
//! textual `type` name used in runbooks. The registry holds factories,
//! never instances; instances are created per artifact production.

use crate::container::ServiceContainer;
use crate::message::Message;
use crate::schema::{InputRequirement, Schema};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Component configuration as declared in a runbook `properties:` block
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Errors raised by connectors, analysers, and their factories
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("invalid properties: {0}")]
    InvalidProperties(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("processing failed: {0}")]
    Processing(String),
    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },
    #[error("service error: {0}")]
    Service(#[from] crate::container::ServiceError),
}

/// A component that produces an initial artifact by reading an external
/// system. Synchronous by contract; the executor runs it on a worker thread.
pub trait Connector: Send {
    fn extract(&self) -> Result<Message, ComponentError>;
}

/// A component that derives an artifact from one or more upstream messages.
pub trait Analyser: Send {
    fn process(
        &self,
        inputs: Vec<Message>,
        output_schema: &Schema,
    ) -> Result<Message, ComponentError>;
}

/// Factory for a named connector type.
pub trait ConnectorFactory: Send + Sync {
    /// Component name matched against runbook `source.type`.
    fn name(&self) -> &str;

    /// The single schema this connector emits.
    fn output_schema(&self) -> Schema;

    /// Compliance-framework tags (informational).
    fn tags(&self) -> &[&str] {
        &[]
    }

    /// Validate configuration shape and dependency availability before
    /// creation.
    fn can_create(&self, properties: &Properties, services: &ServiceContainer) -> bool;

    /// Produce a fresh connector instance configured from `properties`.
    fn create(
        &self,
        properties: &Properties,
        services: &ServiceContainer,
    ) -> Result<Box<dyn Connector>, ComponentError>;
}

/// Factory for a named analyser type.
pub trait AnalyserFactory: Send + Sync {
    /// Component name matched against runbook `process.type`.
    fn name(&self) -> &str;

    /// Accepted input combinations. Each inner list is one acceptable set
    /// of input schemas; the planner matches the provided set exactly
    /// (multiplicity does not matter).
    fn input_requirements(&self) -> Vec<Vec<InputRequirement>>;

    /// Schemas this analyser can emit. The first entry is the default
    /// output when no `output_schema` override is declared.
    fn output_schemas(&self) -> Vec<Schema>;

    /// Compliance-framework tags (informational).
    fn tags(&self) -> &[&str] {
        &[]
    }

    fn can_create(&self, properties: &Properties, services: &ServiceContainer) -> bool;

    /// Produce a fresh analyser. Factories may resolve optional
    /// dependencies (e.g. the LLM client) from the container here.
    fn create(
        &self,
        properties: &Properties,
        services: &ServiceContainer,
    ) -> Result<Box<dyn Analyser>, ComponentError>;
}

/// Maps runbook `type` names to connector and analyser factories.
#[derive(Default, Clone)]
pub struct ComponentRegistry {
    connectors: HashMap<String, Arc<dyn ConnectorFactory>>,
    analysers: HashMap<String, Arc<dyn AnalyserFactory>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector factory under its declared name. A later
    /// registration with the same name replaces the earlier one.
    pub fn register_connector(&mut self, factory: Arc<dyn ConnectorFactory>) {
        self.connectors.insert(factory.name().to_string(), factory);
    }

    pub fn register_analyser(&mut self, factory: Arc<dyn AnalyserFactory>) {
        self.analysers.insert(factory.name().to_string(), factory);
    }

    pub fn connector(&self, name: &str) -> Option<&Arc<dyn ConnectorFactory>> {
        self.connectors.get(name)
    }

    pub fn analyser(&self, name: &str) -> Option<&Arc<dyn AnalyserFactory>> {
        self.analysers.get(name)
    }

    /// Sorted connector names, for error messages.
    pub fn connector_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connectors.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Sorted analyser names, for error messages.
    pub fn analyser_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.analysers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
