// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-runbook flattening
//!
//! Resolves `child_runbook` directives at plan time into a single artifact
//! map. Child artifact ids are rewritten to
//! `<prefix><runbook_name>__<token>__<original_id>`, so the same child
//! used twice yields disjoint id sets. The directive-carrying artifact is
//! not emitted; references to it are rewritten through the alias map.

use crate::error::PlanError;
use dm_core::{namespace_token, ArtifactId, Origin, Properties, Schema};
use dm_runbook::{
    parse_runbook, ArtifactDefinition, ChildRunbookConfig, InputDeclaration, Production, Runbook,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Component, Path, PathBuf};

/// A child input binding whose schema equality is verified once the
/// planner has resolved the bound artifact's output schema.
#[derive(Debug, Clone)]
pub struct BindingCheck {
    /// Child runbook name
    pub child: String,
    /// Namespaced id of the artifact that carried the directive
    pub directive: ArtifactId,
    /// Declared child input name
    pub input: String,
    /// Schema the child declares for this input
    pub declared: Schema,
    /// Namespaced id of the parent artifact bound to it
    pub bound: ArtifactId,
}

/// Result of flattening a runbook tree
#[derive(Debug, Default)]
pub struct FlattenOutput {
    pub artifacts: BTreeMap<ArtifactId, ArtifactDefinition>,
    /// parent artifact name -> namespaced id of the child artifact backing it
    pub aliases: BTreeMap<String, ArtifactId>,
    pub origins: BTreeMap<ArtifactId, Origin>,
    /// Ids whose content must appear as `[REDACTED]` in logs and exports
    pub redacted: BTreeSet<ArtifactId>,
    pub binding_checks: Vec<BindingCheck>,
    /// Alias keys whose directive declared `output: true`; the flag is
    /// transferred to the aliased artifact once all children are emitted
    exposed_aliases: BTreeSet<String>,
}

struct WorkItem {
    runbook: Runbook,
    dir: PathBuf,
    prefix: String,
    /// declared input name -> namespaced artifact id supplied by the caller
    bindings: BTreeMap<String, ArtifactId>,
    /// canonicalised runbook paths on the ancestor chain (self included)
    ancestors: Vec<PathBuf>,
    origin: Origin,
}

struct PendingChild {
    local_id: String,
    config: ChildRunbookConfig,
    runbook: Runbook,
    resolved: PathBuf,
    canonical: PathBuf,
    prefix: String,
}

/// Flatten a parsed parent runbook into a single artifact set.
pub fn flatten(parent: &Runbook, parent_path: &Path) -> Result<FlattenOutput, PlanError> {
    let mut out = FlattenOutput::default();
    let mut used_prefixes: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<WorkItem> = VecDeque::new();

    let parent_dir = parent_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let parent_canonical =
        std::fs::canonicalize(parent_path).unwrap_or_else(|_| parent_path.to_path_buf());

    queue.push_back(WorkItem {
        runbook: parent.clone(),
        dir: parent_dir,
        prefix: String::new(),
        bindings: BTreeMap::new(),
        ancestors: vec![parent_canonical],
        origin: Origin::Parent,
    });

    while let Some(item) = queue.pop_front() {
        process_item(item, &mut out, &mut used_prefixes, &mut queue)?;
    }

    resolve_alias_chains(&mut out);
    Ok(out)
}

/// A child's declared output may itself be a child-runbook directive, in
/// which case an alias points at another alias key rather than an emitted
/// artifact. Chase every alias to its final target, then rewrite the
/// references and redaction markers recorded against intermediate keys.
fn resolve_alias_chains(out: &mut FlattenOutput) {
    let chase = |start: &ArtifactId, aliases: &BTreeMap<String, ArtifactId>| -> ArtifactId {
        let mut target = start.clone();
        // Directive chains are bounded by runbook nesting depth
        for _ in 0..aliases.len() {
            match aliases.get(target.as_str()) {
                Some(next) => target = next.clone(),
                None => break,
            }
        }
        target
    };

    let snapshot = out.aliases.clone();
    for target in out.aliases.values_mut() {
        *target = chase(target, &snapshot);
    }

    for definition in out.artifacts.values_mut() {
        if let Production::Inputs(references) = &mut definition.production {
            for reference in references.iter_mut() {
                if let Some(target) = out.aliases.get(reference.as_str()) {
                    *reference = target.to_string();
                }
            }
        }
    }

    for check in &mut out.binding_checks {
        if let Some(target) = out.aliases.get(check.bound.as_str()) {
            check.bound = target.clone();
        }
    }

    let redacted = std::mem::take(&mut out.redacted);
    out.redacted = redacted
        .into_iter()
        .map(|id| out.aliases.get(id.as_str()).cloned().unwrap_or(id))
        .collect();

    // A directive's `output: true` exposes the child artifact it aliases
    for key in std::mem::take(&mut out.exposed_aliases) {
        if let Some(target) = out.aliases.get(&key).cloned() {
            if let Some(definition) = out.artifacts.get_mut(&target) {
                definition.output = true;
            }
        }
    }
}

fn process_item(
    item: WorkItem,
    out: &mut FlattenOutput,
    used_prefixes: &mut BTreeSet<String>,
    queue: &mut VecDeque<WorkItem>,
) -> Result<(), PlanError> {
    // Phase 1: resolve child directives and record their output aliases,
    // so sibling artifacts can reference directive artifacts in phase 2.
    let mut pending: Vec<PendingChild> = Vec::new();
    for (local_id, definition) in &item.runbook.artifacts {
        let Some(config) = &definition.child_runbook else {
            continue;
        };
        let directive_id = format!("{}{}", item.prefix, local_id);

        let resolved =
            resolve_child_path(&item.dir, &item.runbook.config.template_paths, &config.path)?;
        let canonical = std::fs::canonicalize(&resolved).unwrap_or_else(|_| resolved.clone());
        if item.ancestors.contains(&canonical) {
            let mut cycle: Vec<String> = item
                .ancestors
                .iter()
                .map(|path| path.display().to_string())
                .collect();
            cycle.push(canonical.display().to_string());
            return Err(PlanError::CircularRunbook { cycle });
        }

        let child = parse_runbook(&resolved)?;

        // Every mapped name must be a declared child input
        for input in config.input_mapping.keys() {
            if !child.inputs.contains_key(input) {
                return Err(PlanError::UnknownChildInput {
                    artifact: directive_id.clone(),
                    child: child.name.clone(),
                    input: input.clone(),
                    declared: sorted_names(child.inputs.keys()),
                });
            }
        }

        // Every non-optional declared input must be mapped
        let missing: Vec<String> = child
            .inputs
            .iter()
            .filter(|(name, declaration)| {
                !declaration.optional && !config.input_mapping.contains_key(*name)
            })
            .map(|(name, _)| name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(PlanError::MissingInputMapping {
                artifact: directive_id,
                child: child.name.clone(),
                missing,
            });
        }

        // Fresh namespace; regenerate on the (unlikely) token collision
        let prefix = loop {
            let candidate = format!("{}{}__{}__", item.prefix, child.name, namespace_token());
            if used_prefixes.insert(candidate.clone()) {
                break candidate;
            }
        };

        match (&config.output, &config.output_mapping) {
            (Some(output), None) => {
                let backing = lookup_output(&child, output, &directive_id)?;
                out.aliases.insert(
                    directive_id.clone(),
                    ArtifactId::new(format!("{}{}", prefix, backing)),
                );
                if definition.output {
                    out.exposed_aliases.insert(directive_id.clone());
                }
            }
            (None, Some(mapping)) => {
                for (child_output, exposed) in mapping {
                    let backing = lookup_output(&child, child_output, &directive_id)?;
                    out.aliases.insert(
                        format!("{}{}", item.prefix, exposed),
                        ArtifactId::new(format!("{}{}", prefix, backing)),
                    );
                }
            }
            // Parser enforces output XOR output_mapping
            _ => {}
        }

        pending.push(PendingChild {
            local_id: local_id.clone(),
            config: config.clone(),
            runbook: child,
            resolved,
            canonical,
            prefix,
        });
    }

    // Phase 2: copy this runbook's own artifacts with references rewritten
    for (local_id, definition) in &item.runbook.artifacts {
        if definition.child_runbook.is_some() {
            continue;
        }
        let new_id = ArtifactId::new(format!("{}{}", item.prefix, local_id));
        let mut copied = definition.clone();
        if let Production::Inputs(references) = &mut copied.production {
            for reference in references.iter_mut() {
                *reference = rewrite_reference(reference, &item, &out.aliases);
            }
        }
        out.origins.insert(new_id.clone(), item.origin.clone());
        out.artifacts.insert(new_id, copied);
    }

    // Phase 3: bind child inputs and enqueue the children
    for child in pending {
        let directive_id = ArtifactId::new(format!("{}{}", item.prefix, child.local_id));
        let child_name = child.runbook.name.clone();

        let mut bindings: BTreeMap<String, ArtifactId> = BTreeMap::new();
        for (input, declaration) in &child.runbook.inputs {
            if let Some(parent_ref) = child.config.input_mapping.get(input) {
                let bound =
                    ArtifactId::new(rewrite_reference(parent_ref, &item, &out.aliases));
                if declaration.sensitive {
                    out.redacted.insert(bound.clone());
                }
                out.binding_checks.push(BindingCheck {
                    child: child_name.clone(),
                    directive: directive_id.clone(),
                    input: input.clone(),
                    declared: declaration.input_schema.clone(),
                    bound: bound.clone(),
                });
                bindings.insert(input.clone(), bound);
            } else {
                let id = synthesize_default(
                    &child.prefix,
                    &child.runbook,
                    input,
                    declaration,
                    &child_name,
                    out,
                );
                bindings.insert(input.clone(), id);
            }
        }

        let mut ancestors = item.ancestors.clone();
        ancestors.push(child.canonical);
        let dir = child
            .resolved
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        queue.push_back(WorkItem {
            runbook: child.runbook,
            dir,
            prefix: child.prefix,
            bindings,
            ancestors,
            origin: Origin::Child(child_name),
        });
    }

    Ok(())
}

/// Rewrite one artifact reference within the current runbook scope:
/// declared inputs go through the caller-supplied binding; anything else
/// is namespaced, then routed through the alias map if it names a child
/// directive.
fn rewrite_reference(
    reference: &str,
    item: &WorkItem,
    aliases: &BTreeMap<String, ArtifactId>,
) -> String {
    if let Some(bound) = item.bindings.get(reference) {
        return bound.to_string();
    }
    let namespaced = format!("{}{}", item.prefix, reference);
    match aliases.get(&namespaced) {
        Some(target) => target.to_string(),
        None => namespaced,
    }
}

/// Synthesize a `literal` source carrying the declared default for an
/// optional child input the caller did not map, so downstream child
/// artifacts still have a concrete upstream.
fn synthesize_default(
    prefix: &str,
    child: &Runbook,
    input: &str,
    declaration: &InputDeclaration,
    child_name: &str,
    out: &mut FlattenOutput,
) -> ArtifactId {
    let mut local = format!("default__{}", input);
    while child.artifacts.contains_key(&local) {
        local = format!("default__{}_{}", input, namespace_token());
    }
    let mut id = ArtifactId::new(format!("{}{}", prefix, local));
    while out.artifacts.contains_key(&id) {
        id = ArtifactId::new(format!("{}{}_{}", prefix, local, namespace_token()));
    }

    let mut properties = Properties::new();
    properties.insert(
        "content".to_string(),
        declaration.default.clone().unwrap_or(Value::Null),
    );
    let mut definition = ArtifactDefinition::source("literal", properties);
    definition.output_schema = Some(declaration.input_schema.clone());

    if declaration.sensitive {
        out.redacted.insert(id.clone());
    }
    out.origins
        .insert(id.clone(), Origin::Child(child_name.to_string()));
    out.artifacts.insert(id.clone(), definition);
    id
}

fn lookup_output<'a>(
    child: &'a Runbook,
    output: &str,
    directive_id: &str,
) -> Result<&'a str, PlanError> {
    child
        .outputs
        .get(output)
        .map(|declaration| declaration.artifact.as_str())
        .ok_or_else(|| PlanError::UnknownChildOutput {
            artifact: directive_id.to_string(),
            child: child.name.clone(),
            output: output.to_string(),
            declared: sorted_names(child.outputs.keys()),
        })
}

/// Resolve a child runbook path: relative, no `..`, searched in the
/// parent runbook directory then each `template_paths` entry in order.
fn resolve_child_path(
    dir: &Path,
    template_paths: &[String],
    path: &str,
) -> Result<PathBuf, PlanError> {
    let relative = Path::new(path);
    let traverses_up = relative
        .components()
        .any(|component| matches!(component, Component::ParentDir));
    if path.is_empty() || relative.is_absolute() || traverses_up {
        return Err(PlanError::InvalidPath {
            path: path.to_string(),
        });
    }

    let mut searched: Vec<String> = Vec::new();
    let roots = std::iter::once(dir.to_path_buf())
        .chain(template_paths.iter().map(|template| dir.join(template)));
    for root in roots {
        let candidate = root.join(relative);
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(root.display().to_string());
    }

    Err(PlanError::ChildRunbookNotFound {
        path: path.to_string(),
        searched: searched.join(", "),
    })
}

fn sorted_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let mut sorted: Vec<&str> = names.map(|name| name.as_str()).collect();
    sorted.sort_unstable();
    sorted.join(", ")
}

#[cfg(test)]
#[path = "flatten_tests.rs"]
mod tests;
