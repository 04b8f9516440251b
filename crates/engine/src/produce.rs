// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-artifact production
//!
//! Every component invocation is wrapped here and failures are returned
//! as plain strings: the coordinator records them per artifact and never
//! lets them unwind the run.

use dm_core::{
    ArtifactId, ComponentRegistry, InputRequirement, Message, RunId, Schema, ServiceContainer,
};
use dm_planner::ExecutionPlan;
use dm_runbook::{ArtifactDefinition, Production};
use dm_storage::ArtifactStore;
use std::collections::BTreeSet;

/// Produce the message for one artifact. Execution tagging and the
/// store write happen in the worker.
pub(crate) fn produce_message<S: ArtifactStore + ?Sized>(
    plan: &ExecutionPlan,
    registry: &ComponentRegistry,
    services: &ServiceContainer,
    store: &S,
    run_id: &RunId,
    id: &ArtifactId,
) -> Result<Message, String> {
    let definition = plan
        .artifact(id)
        .ok_or_else(|| format!("artifact '{}' is not part of the plan", id))?;
    let planned = plan.schema(id).and_then(|schema| schema.output.clone());

    match &definition.production {
        Production::Reuse(reuse) => {
            let source_run = RunId::new(reuse.from_run.clone());
            let message = store
                .get(&source_run, &reuse.artifact)
                .map_err(|err| err.to_string())?;
            if let Some(expected) = &planned {
                if message.schema != *expected {
                    return Err(format!(
                        "schema mismatch: reused artifact '{}' from run {} is {}, declared {}",
                        reuse.artifact, reuse.from_run, message.schema, expected
                    ));
                }
            }
            Ok(message)
        }

        Production::Source(source) => {
            let factory = registry
                .connector(&source.connector)
                .ok_or_else(|| format!("unknown connector type '{}'", source.connector))?;
            if !factory.can_create(&source.properties, services) {
                return Err(format!(
                    "connector '{}' is unavailable for this configuration",
                    source.connector
                ));
            }
            let connector = factory
                .create(&source.properties, services)
                .map_err(|err| err.to_string())?;
            let mut message = connector.extract().map_err(|err| err.to_string())?;

            if let Some(expected) = &planned {
                if definition.output_schema.is_some() {
                    // An explicit override relabels the produced message
                    message.schema = expected.clone();
                } else if message.schema != *expected {
                    return Err(format!(
                        "schema mismatch: connector '{}' produced {}, planned {}",
                        source.connector, message.schema, expected
                    ));
                }
            }
            Ok(message)
        }

        Production::Inputs(references) => {
            // Read upstream messages in declared order, multiplicity kept
            let mut inputs = Vec::with_capacity(references.len());
            for reference in references {
                inputs.push(store.get(run_id, reference).map_err(|err| err.to_string())?);
            }

            match &definition.process {
                None => merge_concatenate(id, inputs, planned.as_ref()),
                Some(process) => {
                    let factory = registry
                        .analyser(&process.analyser)
                        .ok_or_else(|| format!("unknown analyser type '{}'", process.analyser))?;
                    if !factory.can_create(&process.properties, services) {
                        return Err(format!(
                            "analyser '{}' is unavailable for this configuration",
                            process.analyser
                        ));
                    }

                    // Requirement checks deferred at plan time (reuse
                    // upstream without an override) run against the
                    // stored schemas now
                    let deferred = plan
                        .schema(id)
                        .map(|schema| schema.inputs.is_none())
                        .unwrap_or(true);
                    if deferred {
                        let provided: BTreeSet<InputRequirement> = inputs
                            .iter()
                            .map(|message| message.schema.as_requirement())
                            .collect();
                        let accepted = factory.input_requirements().iter().any(|combination| {
                            combination
                                .iter()
                                .cloned()
                                .collect::<BTreeSet<InputRequirement>>()
                                == provided
                        });
                        if !accepted {
                            let provided: Vec<String> =
                                provided.iter().map(|r| r.to_string()).collect();
                            return Err(format!(
                                "schema mismatch: analyser '{}' does not accept {{{}}}",
                                process.analyser,
                                provided.join(", ")
                            ));
                        }
                    }

                    let output_schema = planned
                        .ok_or_else(|| format!("no output schema resolved for '{}'", id))?;
                    let analyser = factory
                        .create(&process.properties, services)
                        .map_err(|err| err.to_string())?;
                    let message = analyser
                        .process(inputs, &output_schema)
                        .map_err(|err| err.to_string())?;
                    if message.schema != output_schema {
                        return Err(format!(
                            "analyser '{}' returned {}, expected {}",
                            process.analyser, message.schema, output_schema
                        ));
                    }
                    Ok(message)
                }
            }
        }
    }
}

/// Concatenate merge for same-schema fan-in: array contents are appended
/// element-wise; a non-array content contributes itself as one element.
fn merge_concatenate(
    id: &ArtifactId,
    inputs: Vec<Message>,
    planned: Option<&Schema>,
) -> Result<Message, String> {
    let Some(first) = inputs.first() else {
        return Err("nothing to merge: artifact has no inputs".to_string());
    };
    let first_schema = first.schema.clone();
    for message in &inputs {
        if message.schema != first_schema {
            return Err(format!(
                "concatenate merge requires one schema: found {} and {}",
                first_schema, message.schema
            ));
        }
    }
    let schema = planned.cloned().unwrap_or(first_schema);

    let mut items = Vec::new();
    for message in inputs {
        match message.content {
            serde_json::Value::Array(list) => items.extend(list),
            other => items.push(other),
        }
    }
    Ok(Message::new(
        id.as_str(),
        serde_json::Value::Array(items),
        schema,
    ))
}

pub(crate) fn production_kind(definition: &ArtifactDefinition) -> &'static str {
    match &definition.production {
        Production::Source(_) => "source",
        Production::Inputs(_) => {
            if definition.process.is_some() {
                "process"
            } else {
                "merge"
            }
        }
        Production::Reuse(_) => "reuse",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_core::test_support::{message, standard_input};
    use serde_json::json;

    fn concat(inputs: Vec<Message>) -> Result<Message, String> {
        merge_concatenate(&ArtifactId::new("all"), inputs, None)
    }

    #[test]
    fn concatenate_appends_arrays() {
        let merged = concat(vec![
            standard_input("a", json!([1, 2])),
            standard_input("b", json!([3])),
        ])
        .unwrap();
        assert_eq!(merged.content, json!([1, 2, 3]));
        assert_eq!(merged.id, "all");
        assert_eq!(merged.schema.to_string(), "standard_input/1.0.0");
    }

    #[test]
    fn concatenate_wraps_scalars() {
        let merged = concat(vec![
            standard_input("a", json!([1])),
            standard_input("b", json!({"k": 2})),
            standard_input("c", json!("three")),
        ])
        .unwrap();
        assert_eq!(merged.content, json!([1, {"k": 2}, "three"]));
    }

    #[test]
    fn concatenate_rejects_mixed_schemas() {
        let err = concat(vec![
            standard_input("a", json!([])),
            message("b", "finding", "1.0.0", json!([])),
        ])
        .unwrap_err();
        assert!(err.contains("one schema"));
    }

    #[test]
    fn concatenate_preserves_multiplicity() {
        let a = standard_input("a", json!([1]));
        let merged = concat(vec![a.clone(), a]).unwrap();
        assert_eq!(merged.content, json!([1, 1]));
    }
}
