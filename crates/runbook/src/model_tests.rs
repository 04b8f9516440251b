// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dm_core::Properties;
use serde_json::json;

#[test]
fn source_builder_sets_production() {
    let mut properties = Properties::new();
    properties.insert("path".into(), json!("/data"));
    let def = ArtifactDefinition::source("file", properties);
    assert!(def.is_source());
    assert!(def.inputs().is_empty());
    assert_eq!(def.merge, MergeStrategy::Concatenate);
}

#[test]
fn derived_builder_keeps_input_order() {
    let def = ArtifactDefinition::derived(vec!["b".into(), "a".into()]);
    assert_eq!(def.inputs(), ["b", "a"]);
    assert!(!def.is_source());
    assert!(!def.is_reuse());
}

#[test]
fn artifact_serializes_production_variant_as_its_field() {
    let def = ArtifactDefinition::source("file", Properties::new());
    let yaml = serde_yaml::to_string(&def).unwrap();
    assert!(yaml.contains("source:"));
    assert!(!yaml.contains("inputs:"));
    assert!(!yaml.contains("reuse:"));

    let def = ArtifactDefinition::derived(vec!["a".into()]);
    let yaml = serde_yaml::to_string(&def).unwrap();
    assert!(yaml.contains("inputs:"));
    assert!(!yaml.contains("source:"));
}

#[test]
fn artifact_serialization_skips_defaults() {
    let def = ArtifactDefinition::derived(vec!["a".into()]);
    let yaml = serde_yaml::to_string(&def).unwrap();
    assert!(!yaml.contains("output"));
    assert!(!yaml.contains("optional"));
    assert!(!yaml.contains("name"));
}

#[test]
fn config_default_concurrency_is_ten() {
    assert_eq!(RunbookConfig::default().max_concurrency, DEFAULT_MAX_CONCURRENCY);
    assert_eq!(DEFAULT_MAX_CONCURRENCY, 10);
}
