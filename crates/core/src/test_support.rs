// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::container::ServiceContainer;
use crate::message::Message;
use crate::registry::{
    Analyser, AnalyserFactory, ComponentError, Connector, ConnectorFactory, Properties,
};
use crate::schema::{InputRequirement, Schema};
use serde_json::Value;

// ── Message builders ─────────────────────────────────────────────────────────

pub fn message(id: &str, name: &str, version: &str, content: Value) -> Message {
    Message::new(id, content, Schema::new(name, version))
}

pub fn standard_input(id: &str, content: Value) -> Message {
    message(id, "standard_input", "1.0.0", content)
}

// ── Stub connector ───────────────────────────────────────────────────────────

/// Minimal connector factory emitting a fixed content value.
///
/// For richer fakes (call recording, scripted failures, concurrency gauges)
/// use `dm-components` with the `test-support` feature.
pub struct StubConnectorFactory {
    name: String,
    schema: Schema,
    content: Value,
    available: bool,
}

impl StubConnectorFactory {
    pub fn new(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            schema,
            content: Value::Null,
            available: true,
        }
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = content;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

struct StubConnector {
    schema: Schema,
    content: Value,
}

impl Connector for StubConnector {
    fn extract(&self) -> Result<Message, ComponentError> {
        Ok(Message::new("stub", self.content.clone(), self.schema.clone()))
    }
}

impl ConnectorFactory for StubConnectorFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_schema(&self) -> Schema {
        self.schema.clone()
    }

    fn can_create(&self, _properties: &Properties, _services: &ServiceContainer) -> bool {
        self.available
    }

    fn create(
        &self,
        _properties: &Properties,
        _services: &ServiceContainer,
    ) -> Result<Box<dyn Connector>, ComponentError> {
        Ok(Box::new(StubConnector {
            schema: self.schema.clone(),
            content: self.content.clone(),
        }))
    }
}

// ── Stub analyser ────────────────────────────────────────────────────────────

/// Minimal analyser factory collecting input contents into a JSON array.
pub struct StubAnalyserFactory {
    name: String,
    requirements: Vec<Vec<InputRequirement>>,
    outputs: Vec<Schema>,
}

impl StubAnalyserFactory {
    pub fn new(name: &str, requirements: Vec<Vec<InputRequirement>>, output: Schema) -> Self {
        Self {
            name: name.to_string(),
            requirements,
            outputs: vec![output],
        }
    }

    /// Analyser accepting exactly one schema and emitting another.
    pub fn simple(name: &str, accepts: Schema, emits: Schema) -> Self {
        Self::new(name, vec![vec![accepts.as_requirement()]], emits)
    }
}

struct StubAnalyser;

impl Analyser for StubAnalyser {
    fn process(
        &self,
        inputs: Vec<Message>,
        output_schema: &Schema,
    ) -> Result<Message, ComponentError> {
        let contents: Vec<Value> = inputs.into_iter().map(|m| m.content).collect();
        Ok(Message::new(
            "stub",
            Value::Array(contents),
            output_schema.clone(),
        ))
    }
}

impl AnalyserFactory for StubAnalyserFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_requirements(&self) -> Vec<Vec<InputRequirement>> {
        self.requirements.clone()
    }

    fn output_schemas(&self) -> Vec<Schema> {
        self.outputs.clone()
    }

    fn can_create(&self, _properties: &Properties, _services: &ServiceContainer) -> bool {
        true
    }

    fn create(
        &self,
        _properties: &Properties,
        _services: &ServiceContainer,
    ) -> Result<Box<dyn Analyser>, ComponentError> {
        Ok(Box::new(StubAnalyser))
    }
}
