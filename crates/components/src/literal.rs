// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `literal` connector: emits configured content verbatim
//!
//! Used for inline fixtures and by the planner when it synthesizes
//! defaults for unmapped optional child inputs.

use dm_core::{
    ComponentError, Connector, ConnectorFactory, Message, Properties, Schema, ServiceContainer,
};
use serde_json::Value;

/// Factory for the `literal` connector.
///
/// Properties: `content` (required, any value), `schema` (optional
/// `"name/version"` override of the emitted schema; the artifact-level
/// `output_schema` override achieves the same at the plan layer).
pub struct LiteralConnectorFactory;

struct LiteralConnector {
    content: Value,
    schema: Schema,
}

impl Connector for LiteralConnector {
    fn extract(&self) -> Result<Message, ComponentError> {
        Ok(Message::new(
            "literal",
            self.content.clone(),
            self.schema.clone(),
        ))
    }
}

impl ConnectorFactory for LiteralConnectorFactory {
    fn name(&self) -> &str {
        "literal"
    }

    fn output_schema(&self) -> Schema {
        let (name, version) = crate::STANDARD_INPUT_SCHEMA;
        Schema::new(name, version)
    }

    fn can_create(&self, properties: &Properties, _services: &ServiceContainer) -> bool {
        properties.contains_key("content")
    }

    fn create(
        &self,
        properties: &Properties,
        _services: &ServiceContainer,
    ) -> Result<Box<dyn Connector>, ComponentError> {
        let content = properties
            .get("content")
            .cloned()
            .ok_or_else(|| ComponentError::InvalidProperties("'content' is required".into()))?;
        let schema = match properties.get("schema") {
            None => self.output_schema(),
            Some(Value::String(reference)) => reference
                .parse()
                .map_err(|err| ComponentError::InvalidProperties(format!("{err}")))?,
            Some(other) => {
                return Err(ComponentError::InvalidProperties(format!(
                    "'schema' must be a string, got {other}"
                )))
            }
        };
        Ok(Box::new(LiteralConnector { content, schema }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(properties: Properties) -> Result<Box<dyn Connector>, ComponentError> {
        LiteralConnectorFactory.create(&properties, &ServiceContainer::new())
    }

    #[test]
    fn emits_configured_content() {
        let mut properties = Properties::new();
        properties.insert("content".into(), json!({"rows": [1, 2]}));
        let message = create(properties).unwrap().extract().unwrap();
        assert_eq!(message.content, json!({"rows": [1, 2]}));
        assert_eq!(message.schema.to_string(), "standard_input/1.0.0");
    }

    #[test]
    fn null_content_is_a_valid_value() {
        let mut properties = Properties::new();
        properties.insert("content".into(), Value::Null);
        assert!(LiteralConnectorFactory.can_create(&properties, &ServiceContainer::new()));
        let message = create(properties).unwrap().extract().unwrap();
        assert_eq!(message.content, Value::Null);
    }

    #[test]
    fn schema_property_overrides_default() {
        let mut properties = Properties::new();
        properties.insert("content".into(), json!([]));
        properties.insert("schema".into(), json!("config/1.0.0"));
        let message = create(properties).unwrap().extract().unwrap();
        assert_eq!(message.schema.to_string(), "config/1.0.0");
    }

    #[test]
    fn missing_content_is_unavailable() {
        let properties = Properties::new();
        assert!(!LiteralConnectorFactory.can_create(&properties, &ServiceContainer::new()));
        assert!(create(properties).is_err());
    }
}
