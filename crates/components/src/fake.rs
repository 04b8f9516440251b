// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake connectors and analysers for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use dm_core::{
    Analyser, AnalyserFactory, ComponentError, Connector, ConnectorFactory, InputRequirement,
    Message, Properties, Schema, ServiceContainer,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tracks how many fake components run at once, and the observed peak.
///
/// Share one gauge across factories to assert `max_concurrency` bounds.
#[derive(Clone, Default)]
pub struct ConcurrencyGauge {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard {
            current: Arc::clone(&self.current),
        }
    }
}

struct GaugeGuard {
    current: Arc<AtomicUsize>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Fake connector ───────────────────────────────────────────────────────────

struct FakeConnectorState {
    extract_calls: usize,
}

/// Fake connector factory with scripted content or failure.
///
/// Records extraction calls; clones share state.
#[derive(Clone)]
pub struct FakeConnectorFactory {
    name: String,
    schema: Schema,
    content: Value,
    fail_with: Option<String>,
    available: bool,
    delay: Option<Duration>,
    gauge: Option<ConcurrencyGauge>,
    state: Arc<Mutex<FakeConnectorState>>,
}

impl FakeConnectorFactory {
    pub fn new(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            schema,
            content: Value::Null,
            fail_with: None,
            available: true,
            delay: None,
            gauge: None,
            state: Arc::new(Mutex::new(FakeConnectorState { extract_calls: 0 })),
        }
    }

    /// Connector emitting `standard_input/1.0.0`.
    pub fn standard(name: &str) -> Self {
        Self::new(name, Schema::new("standard_input", "1.0.0"))
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = content;
        self
    }

    /// Every extraction fails with the given message.
    pub fn failing(mut self, error: &str) -> Self {
        self.fail_with = Some(error.to_string());
        self
    }

    /// `can_create` reports unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Sleep inside `extract` (for concurrency assertions).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_gauge(mut self, gauge: &ConcurrencyGauge) -> Self {
        self.gauge = Some(gauge.clone());
        self
    }

    /// Number of `extract` calls across all created instances.
    pub fn extract_calls(&self) -> usize {
        self.state.lock().extract_calls
    }
}

struct FakeConnector {
    factory: FakeConnectorFactory,
}

impl Connector for FakeConnector {
    fn extract(&self) -> Result<Message, ComponentError> {
        let _guard = self.factory.gauge.as_ref().map(|gauge| gauge.enter());
        self.factory.state.lock().extract_calls += 1;
        if let Some(delay) = self.factory.delay {
            std::thread::sleep(delay);
        }
        if let Some(ref error) = self.factory.fail_with {
            return Err(ComponentError::Extraction(error.clone()));
        }
        Ok(Message::new(
            self.factory.name.clone(),
            self.factory.content.clone(),
            self.factory.schema.clone(),
        ))
    }
}

impl ConnectorFactory for FakeConnectorFactory {
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
        Ok(Box::new(FakeConnector {
            factory: self.clone(),
        }))
    }
}

// ── Fake analyser ────────────────────────────────────────────────────────────

/// One recorded `process` call: input message ids in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCall {
    pub input_ids: Vec<String>,
}

struct FakeAnalyserState {
    calls: Vec<ProcessCall>,
}

/// Fake analyser factory. The created analyser collects every input's
/// content into a JSON array and emits it under the requested schema.
#[derive(Clone)]
pub struct FakeAnalyserFactory {
    name: String,
    requirements: Vec<Vec<InputRequirement>>,
    outputs: Vec<Schema>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    gauge: Option<ConcurrencyGauge>,
    state: Arc<Mutex<FakeAnalyserState>>,
}

impl FakeAnalyserFactory {
    pub fn new(name: &str, requirements: Vec<Vec<InputRequirement>>, output: Schema) -> Self {
        Self {
            name: name.to_string(),
            requirements,
            outputs: vec![output],
            fail_with: None,
            delay: None,
            gauge: None,
            state: Arc::new(Mutex::new(FakeAnalyserState { calls: Vec::new() })),
        }
    }

    /// Analyser accepting `standard_input/1.0.0` and emitting
    /// `finding/1.0.0`.
    pub fn classifier(name: &str) -> Self {
        Self::new(
            name,
            vec![vec![InputRequirement::new("standard_input", "1.0.0")]],
            Schema::new("finding", "1.0.0"),
        )
    }

    pub fn failing(mut self, error: &str) -> Self {
        self.fail_with = Some(error.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_gauge(mut self, gauge: &ConcurrencyGauge) -> Self {
        self.gauge = Some(gauge.clone());
        self
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.state.lock().calls.clone()
    }
}

struct FakeAnalyser {
    factory: FakeAnalyserFactory,
}

impl Analyser for FakeAnalyser {
    fn process(
        &self,
        inputs: Vec<Message>,
        output_schema: &Schema,
    ) -> Result<Message, ComponentError> {
        let _guard = self.factory.gauge.as_ref().map(|gauge| gauge.enter());
        self.factory.state.lock().calls.push(ProcessCall {
            input_ids: inputs.iter().map(|message| message.id.clone()).collect(),
        });
        if let Some(delay) = self.factory.delay {
            std::thread::sleep(delay);
        }
        if let Some(ref error) = self.factory.fail_with {
            return Err(ComponentError::Processing(error.clone()));
        }
        let contents: Vec<Value> = inputs.into_iter().map(|message| message.content).collect();
        Ok(Message::new(
            self.factory.name.clone(),
            Value::Array(contents),
            output_schema.clone(),
        ))
    }
}

impl AnalyserFactory for FakeAnalyserFactory {
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
        Ok(Box::new(FakeAnalyser {
            factory: self.clone(),
        }))
    }
}
