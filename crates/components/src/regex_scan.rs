// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `regex_scan` analyser: named pattern matching over extracted records
//!
//! Accepts `standard_input/1.0.0` messages whose content is a list of
//! `{path, text}` records (bare strings are scanned too) and emits one
//! `finding/1.0.0` record per pattern match.

use dm_core::{
    Analyser, AnalyserFactory, ComponentError, InputRequirement, Message, Properties, Schema,
    ServiceContainer,
};
use regex::Regex;
use serde_json::{json, Value};

/// Factory for the `regex_scan` analyser.
///
/// Properties: `patterns` (required): map of pattern name to regex.
pub struct RegexScanAnalyserFactory;

struct RegexScanAnalyser {
    patterns: Vec<(String, Regex)>,
}

fn compile_patterns(properties: &Properties) -> Result<Vec<(String, Regex)>, ComponentError> {
    let Some(Value::Object(patterns)) = properties.get("patterns") else {
        return Err(ComponentError::InvalidProperties(
            "'patterns' is required and must be a map of name to regex".into(),
        ));
    };
    if patterns.is_empty() {
        return Err(ComponentError::InvalidProperties(
            "'patterns' must not be empty".into(),
        ));
    }

    let mut compiled = Vec::with_capacity(patterns.len());
    for (name, pattern) in patterns {
        let Some(pattern) = pattern.as_str() else {
            return Err(ComponentError::InvalidProperties(format!(
                "pattern '{name}' must be a string"
            )));
        };
        let regex = Regex::new(pattern).map_err(|err| {
            ComponentError::InvalidProperties(format!("pattern '{name}' is invalid: {err}"))
        })?;
        compiled.push((name.clone(), regex));
    }
    Ok(compiled)
}

impl RegexScanAnalyser {
    fn scan_text(&self, source: &str, path: Option<&str>, text: &str, findings: &mut Vec<Value>) {
        for (name, regex) in &self.patterns {
            for matched in regex.find_iter(text) {
                findings.push(json!({
                    "source": source,
                    "path": path,
                    "pattern": name,
                    "matched": matched.as_str(),
                }));
            }
        }
    }
}

impl Analyser for RegexScanAnalyser {
    fn process(
        &self,
        inputs: Vec<Message>,
        output_schema: &Schema,
    ) -> Result<Message, ComponentError> {
        let mut findings = Vec::new();
        for message in &inputs {
            let records = match &message.content {
                Value::Array(records) => records.as_slice(),
                other => std::slice::from_ref(other),
            };
            for record in records {
                match record {
                    Value::String(text) => {
                        self.scan_text(&message.id, None, text, &mut findings)
                    }
                    Value::Object(fields) => {
                        let path = fields.get("path").and_then(|p| p.as_str());
                        let Some(text) = fields.get("text").and_then(|t| t.as_str()) else {
                            continue;
                        };
                        self.scan_text(&message.id, path, text, &mut findings);
                    }
                    _ => {}
                }
            }
        }

        Ok(Message::new(
            "regex_scan",
            Value::Array(findings),
            output_schema.clone(),
        ))
    }
}

impl AnalyserFactory for RegexScanAnalyserFactory {
    fn name(&self) -> &str {
        "regex_scan"
    }

    fn input_requirements(&self) -> Vec<Vec<InputRequirement>> {
        let (name, version) = crate::STANDARD_INPUT_SCHEMA;
        vec![vec![InputRequirement::new(name, version)]]
    }

    fn output_schemas(&self) -> Vec<Schema> {
        let (name, version) = crate::FINDING_SCHEMA;
        vec![Schema::new(name, version)]
    }

    fn tags(&self) -> &[&str] {
        &["gdpr"]
    }

    fn can_create(&self, properties: &Properties, _services: &ServiceContainer) -> bool {
        compile_patterns(properties).is_ok()
    }

    fn create(
        &self,
        properties: &Properties,
        _services: &ServiceContainer,
    ) -> Result<Box<dyn Analyser>, ComponentError> {
        Ok(Box::new(RegexScanAnalyser {
            patterns: compile_patterns(properties)?,
        }))
    }
}
