// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan compilation pipeline
//!
//! parse -> flatten -> DAG -> reference validation -> schema resolution.
//! Schema resolution walks artifacts in topological order so every
//! upstream schema is known (or explicitly deferred, for reuse artifacts
//! without an `output_schema` override) before its consumers are checked.

use crate::dag::ExecutionDag;
use crate::error::PlanError;
use crate::flatten::{flatten, FlattenOutput};
use crate::plan::{ArtifactSchema, ExecutionPlan};
use dm_core::{ArtifactId, ComponentRegistry, InputRequirement, Schema};
use dm_runbook::{parse_runbook, ArtifactDefinition, Production, Runbook};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Compiles runbooks into immutable execution plans.
pub struct Planner<'r> {
    registry: &'r ComponentRegistry,
}

impl<'r> Planner<'r> {
    pub fn new(registry: &'r ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Parse and compile the runbook at `runbook_path`.
    pub fn plan(&self, runbook_path: &Path) -> Result<ExecutionPlan, PlanError> {
        // 1. Parse the parent runbook
        let runbook = parse_runbook(runbook_path)?;
        self.plan_parsed(runbook, runbook_path)
    }

    /// Compile an already-parsed parent runbook. `runbook_path` anchors
    /// child-runbook resolution and is recorded in run metadata.
    pub fn plan_parsed(
        &self,
        runbook: Runbook,
        runbook_path: &Path,
    ) -> Result<ExecutionPlan, PlanError> {
        // 2. Flatten child runbooks
        let flat = flatten(&runbook, runbook_path)?;

        // 3. Build the dependency DAG and reject cycles
        let declared: BTreeMap<ArtifactId, BTreeSet<ArtifactId>> = flat
            .artifacts
            .iter()
            .map(|(id, definition)| {
                let deps: BTreeSet<ArtifactId> = definition
                    .inputs()
                    .iter()
                    .map(|reference| ArtifactId::new(reference.clone()))
                    .collect();
                (id.clone(), deps)
            })
            .collect();
        let dag = ExecutionDag::new(declared);
        dag.validate()?;

        // 4. Reference validation: every input must name a flattened artifact
        for (id, definition) in &flat.artifacts {
            for reference in definition.inputs() {
                if !flat.artifacts.contains_key(reference.as_str()) {
                    return Err(PlanError::MissingArtifact {
                        id: reference.clone(),
                        referrer: id.to_string(),
                    });
                }
            }
        }

        // 5. Schema resolution in topological order. Each child input
        //    binding is verified as soon as the bound artifact resolves,
        //    before any child artifact consuming it is reached.
        let mut checks_by_bound: BTreeMap<&ArtifactId, Vec<&crate::flatten::BindingCheck>> =
            BTreeMap::new();
        for check in &flat.binding_checks {
            checks_by_bound.entry(&check.bound).or_default().push(check);
        }

        let mut schemas: BTreeMap<ArtifactId, ArtifactSchema> = BTreeMap::new();
        let mut sorter = dag.sorter();
        while sorter.is_active() {
            let ready = sorter.get_ready();
            if ready.is_empty() {
                // Unreachable on a validated DAG
                break;
            }
            for id in ready {
                let definition = flat
                    .artifacts
                    .get(&id)
                    .ok_or_else(|| PlanError::MissingArtifact {
                        id: id.to_string(),
                        referrer: id.to_string(),
                    })?;
                let resolved = self.resolve_schema(&id, definition, &schemas)?;

                for check in checks_by_bound.get(&id).into_iter().flatten() {
                    match resolved.output.as_ref() {
                        Some(found) if *found != check.declared => {
                            return Err(PlanError::InputSchemaMismatch {
                                child: check.child.clone(),
                                input: check.input.clone(),
                                declared: check.declared.to_string(),
                                bound: check.bound.to_string(),
                                found: found.to_string(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            // Reuse artifact without an override: the
                            // stored message's schema is checked at
                            // execution time.
                            tracing::debug!(
                                child = %check.child,
                                input = %check.input,
                                bound = %check.bound,
                                "child input schema check deferred to execution"
                            );
                        }
                    }
                }

                schemas.insert(id.clone(), resolved);
                sorter.done(&id);
            }
        }

        // 7. Assemble the immutable plan
        let FlattenOutput {
            artifacts,
            aliases,
            origins,
            redacted,
            ..
        } = flat;
        Ok(ExecutionPlan::new(
            runbook,
            runbook_path.to_path_buf(),
            artifacts,
            dag,
            schemas,
            aliases,
            origins,
            redacted,
        ))
    }

    fn resolve_schema(
        &self,
        id: &ArtifactId,
        definition: &ArtifactDefinition,
        schemas: &BTreeMap<ArtifactId, ArtifactSchema>,
    ) -> Result<ArtifactSchema, PlanError> {
        let override_schema = definition.output_schema.clone();
        match &definition.production {
            Production::Source(source) => {
                let factory = self.registry.connector(&source.connector).ok_or_else(|| {
                    PlanError::ComponentNotFound {
                        kind: "connector",
                        name: source.connector.clone(),
                        available: self.registry.connector_names().join(", "),
                    }
                })?;
                Ok(ArtifactSchema {
                    inputs: None,
                    output: Some(override_schema.unwrap_or_else(|| factory.output_schema())),
                })
            }

            Production::Reuse(_) => {
                // The stored message's schema is unknown until execution;
                // an override stands in for it during downstream checks.
                if override_schema.is_none() {
                    tracing::debug!(
                        artifact = %id,
                        "reuse artifact without output_schema: downstream schema checks deferred"
                    );
                }
                Ok(ArtifactSchema {
                    inputs: None,
                    output: override_schema,
                })
            }

            Production::Inputs(references) => {
                let mut upstream: Vec<Option<&Schema>> = Vec::with_capacity(references.len());
                for reference in references {
                    upstream.push(
                        schemas
                            .get(reference.as_str())
                            .and_then(|schema| schema.output.as_ref()),
                    );
                }
                let deferred = upstream.iter().any(|schema| schema.is_none());
                let provided: BTreeSet<InputRequirement> = upstream
                    .iter()
                    .flatten()
                    .map(|schema| schema.as_requirement())
                    .collect();

                match &definition.process {
                    None => {
                        if deferred {
                            return Ok(ArtifactSchema {
                                inputs: None,
                                output: override_schema,
                            });
                        }
                        if provided.len() != 1 {
                            return Err(PlanError::MixedSchemas {
                                artifact: id.to_string(),
                                found: format_requirements(&provided),
                            });
                        }
                        let common = upstream.first().copied().flatten().cloned();
                        Ok(ArtifactSchema {
                            inputs: None,
                            output: override_schema.or(common),
                        })
                    }

                    Some(process) => {
                        let factory =
                            self.registry.analyser(&process.analyser).ok_or_else(|| {
                                PlanError::ComponentNotFound {
                                    kind: "analyser",
                                    name: process.analyser.clone(),
                                    available: self.registry.analyser_names().join(", "),
                                }
                            })?;
                        let combinations = factory.input_requirements();
                        let output = match override_schema {
                            Some(schema) => schema,
                            None => factory.output_schemas().into_iter().next().ok_or_else(
                                || PlanError::NoDeclaredOutput {
                                    name: process.analyser.clone(),
                                },
                            )?,
                        };

                        if deferred {
                            // A reuse upstream without an override: match at
                            // execution time against the stored schema.
                            return Ok(ArtifactSchema {
                                inputs: None,
                                output: Some(output),
                            });
                        }

                        let matched = combinations.iter().find(|combination| {
                            let accepted: BTreeSet<InputRequirement> =
                                combination.iter().cloned().collect();
                            accepted == provided
                        });
                        match matched {
                            Some(combination) => Ok(ArtifactSchema {
                                inputs: Some(combination.clone()),
                                output: Some(output),
                            }),
                            None => Err(PlanError::SchemaCompatibility {
                                artifact: id.to_string(),
                                analyser: process.analyser.clone(),
                                provided: format_requirements(&provided),
                                available: format_combinations(&combinations),
                            }),
                        }
                    }
                }
            }
        }
    }
}

fn format_requirements(requirements: &BTreeSet<InputRequirement>) -> String {
    requirements
        .iter()
        .map(|requirement| requirement.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_combinations(combinations: &[Vec<InputRequirement>]) -> String {
    if combinations.is_empty() {
        return "(none)".to_string();
    }
    combinations
        .iter()
        .map(|combination| {
            let set: BTreeSet<InputRequirement> = combination.iter().cloned().collect();
            format!("{{{}}}", format_requirements(&set))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
