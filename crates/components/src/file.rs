// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `file` connector: reads a UTF-8 file or directory tree
//!
//! Content is a list of `{path, text}` records under
//! `standard_input/1.0.0`. Binary files are skipped; the walk is sorted so
//! repeated extractions of an unchanged tree are identical.

use dm_core::{
    ComponentError, Connector, ConnectorFactory, Message, Properties, Schema, ServiceContainer,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_FILES: u64 = 10_000;

/// Factory for the `file` connector.
///
/// Properties: `path` (required), `max_files` (optional cap on the number
/// of files read from a directory tree, default 10000).
pub struct FileConnectorFactory;

struct FileConnector {
    path: PathBuf,
    max_files: u64,
}

impl FileConnector {
    fn read_one(&self, path: &Path, records: &mut Vec<Value>) -> Result<(), ComponentError> {
        let bytes =
            std::fs::read(path).map_err(|err| ComponentError::Extraction(err.to_string()))?;
        if let Ok(text) = String::from_utf8(bytes) {
            records.push(json!({"path": path.display().to_string(), "text": text}));
        }
        Ok(())
    }

    fn walk(&self, dir: &Path, records: &mut Vec<Value>) -> Result<(), ComponentError> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|err| ComponentError::Extraction(err.to_string()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(|err| ComponentError::Extraction(err.to_string()))?;
        entries.sort();

        for entry in entries {
            if records.len() as u64 >= self.max_files {
                tracing::warn!(
                    path = %self.path.display(),
                    max_files = self.max_files,
                    "file connector reached max_files, truncating walk"
                );
                return Ok(());
            }
            if entry.is_dir() {
                self.walk(&entry, records)?;
            } else if entry.is_file() {
                self.read_one(&entry, records)?;
            }
        }
        Ok(())
    }
}

impl Connector for FileConnector {
    fn extract(&self) -> Result<Message, ComponentError> {
        let mut records = Vec::new();
        if self.path.is_dir() {
            self.walk(&self.path, &mut records)?;
        } else if self.path.is_file() {
            self.read_one(&self.path, &mut records)?;
        } else {
            return Err(ComponentError::Extraction(format!(
                "path does not exist: {}",
                self.path.display()
            )));
        }

        let (name, version) = crate::STANDARD_INPUT_SCHEMA;
        Ok(Message::new(
            "file",
            Value::Array(records),
            Schema::new(name, version),
        ))
    }
}

impl ConnectorFactory for FileConnectorFactory {
    fn name(&self) -> &str {
        "file"
    }

    fn output_schema(&self) -> Schema {
        let (name, version) = crate::STANDARD_INPUT_SCHEMA;
        Schema::new(name, version)
    }

    fn can_create(&self, properties: &Properties, _services: &ServiceContainer) -> bool {
        matches!(properties.get("path"), Some(Value::String(path)) if !path.is_empty())
    }

    fn create(
        &self,
        properties: &Properties,
        _services: &ServiceContainer,
    ) -> Result<Box<dyn Connector>, ComponentError> {
        let path = match properties.get("path") {
            Some(Value::String(path)) if !path.is_empty() => PathBuf::from(path),
            _ => {
                return Err(ComponentError::InvalidProperties(
                    "'path' is required and must be a non-empty string".into(),
                ))
            }
        };
        let max_files = match properties.get("max_files") {
            None => DEFAULT_MAX_FILES,
            Some(value) => value.as_u64().ok_or_else(|| {
                ComponentError::InvalidProperties("'max_files' must be a positive integer".into())
            })?,
        };
        Ok(Box::new(FileConnector { path, max_files }))
    }
}
