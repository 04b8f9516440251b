// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution DAG and topological ready-set generator
//!
//! Nodes are artifact ids; edges come from each artifact's declared
//! `inputs`. Values live in the plan's artifact map and the graph holds
//! ids only. Edges pointing at ids outside the node set are ignored here;
//! the planner's reference validation reports them.

use crate::error::PlanError;
use dm_core::ArtifactId;
use std::collections::{BTreeMap, BTreeSet};

/// Dependency graph over artifact ids
#[derive(Debug, Clone)]
pub struct ExecutionDag {
    /// id -> ids it depends on (within the node set)
    deps: BTreeMap<ArtifactId, BTreeSet<ArtifactId>>,
    /// id -> ids that depend on it
    dependents: BTreeMap<ArtifactId, BTreeSet<ArtifactId>>,
}

impl ExecutionDag {
    pub fn new(declared: BTreeMap<ArtifactId, BTreeSet<ArtifactId>>) -> Self {
        let mut deps: BTreeMap<ArtifactId, BTreeSet<ArtifactId>> = BTreeMap::new();
        let mut dependents: BTreeMap<ArtifactId, BTreeSet<ArtifactId>> = declared
            .keys()
            .map(|id| (id.clone(), BTreeSet::new()))
            .collect();

        for (id, declared_deps) in &declared {
            let known: BTreeSet<ArtifactId> = declared_deps
                .iter()
                .filter(|dep| declared.contains_key(*dep))
                .cloned()
                .collect();
            for dep in &known {
                if let Some(set) = dependents.get_mut(dep) {
                    set.insert(id.clone());
                }
            }
            deps.insert(id.clone(), known);
        }

        Self { deps, dependents }
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ArtifactId> {
        self.deps.keys()
    }

    pub fn dependencies(&self, id: &ArtifactId) -> Option<&BTreeSet<ArtifactId>> {
        self.deps.get(id)
    }

    /// All ids transitively downstream of `id` (excluding `id` itself).
    pub fn transitive_dependents(&self, id: &ArtifactId) -> BTreeSet<ArtifactId> {
        let mut seen: BTreeSet<ArtifactId> = BTreeSet::new();
        let mut frontier: Vec<&ArtifactId> = vec![id];
        while let Some(current) = frontier.pop() {
            if let Some(next) = self.dependents.get(current) {
                for dependent in next {
                    if seen.insert(dependent.clone()) {
                        frontier.push(dependent);
                    }
                }
            }
        }
        seen
    }

    /// Check acyclicity; on failure the error lists one concrete cycle.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut sorter = self.sorter();
        while sorter.is_active() {
            let ready = sorter.get_ready();
            if ready.is_empty() {
                let remaining: BTreeSet<ArtifactId> = self
                    .deps
                    .keys()
                    .filter(|id| !sorter.finished.contains(*id))
                    .cloned()
                    .collect();
                return Err(PlanError::Cycle {
                    cycle: self.extract_cycle(&remaining),
                });
            }
            for id in ready {
                sorter.done(&id);
            }
        }
        Ok(())
    }

    /// A fresh topological iterator over this graph.
    pub fn sorter(&self) -> TopoSorter {
        let indegree: BTreeMap<ArtifactId, usize> = self
            .deps
            .iter()
            .map(|(id, deps)| (id.clone(), deps.len()))
            .collect();
        let ready: BTreeSet<ArtifactId> = indegree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(id, _)| id.clone())
            .collect();
        TopoSorter {
            indegree,
            dependents: self.dependents.clone(),
            ready,
            finished: BTreeSet::new(),
            total: self.deps.len(),
        }
    }

    /// Walk any remaining node's dependencies within the remaining set
    /// until one repeats. Every node left over by Kahn's algorithm has at
    /// least one unfinished dependency, so the walk must close a loop.
    fn extract_cycle(&self, remaining: &BTreeSet<ArtifactId>) -> Vec<String> {
        let Some(start) = remaining.iter().next() else {
            return Vec::new();
        };
        let mut path: Vec<&ArtifactId> = Vec::new();
        let mut positions: BTreeMap<&ArtifactId, usize> = BTreeMap::new();
        let mut current = start;
        loop {
            if let Some(&at) = positions.get(current) {
                let mut cycle: Vec<String> =
                    path[at..].iter().map(|id| id.to_string()).collect();
                cycle.push(current.to_string());
                return cycle;
            }
            positions.insert(current, path.len());
            path.push(current);
            let next = self
                .deps
                .get(current)
                .and_then(|deps| deps.iter().find(|dep| remaining.contains(*dep)));
            match next {
                Some(dep) => current = dep,
                None => return path.iter().map(|id| id.to_string()).collect(),
            }
        }
    }
}

/// Kahn-style topological iterator.
///
/// Not thread-safe; the executor's coordinator owns it exclusively.
pub struct TopoSorter {
    indegree: BTreeMap<ArtifactId, usize>,
    dependents: BTreeMap<ArtifactId, BTreeSet<ArtifactId>>,
    ready: BTreeSet<ArtifactId>,
    finished: BTreeSet<ArtifactId>,
    total: usize,
}

impl TopoSorter {
    /// Drain the ids whose dependencies are all done. Returns an empty set
    /// while every remaining id still waits on in-flight work.
    pub fn get_ready(&mut self) -> BTreeSet<ArtifactId> {
        std::mem::take(&mut self.ready)
    }

    /// Record completion of `id`, releasing dependents whose last
    /// dependency this was. Idempotent, and valid for ids that were never
    /// returned by `get_ready` (used when seeding resumed state).
    pub fn done(&mut self, id: &ArtifactId) {
        if !self.finished.insert(id.clone()) {
            return;
        }
        self.ready.remove(id);
        if let Some(dependents) = self.dependents.get(id).cloned() {
            for dependent in dependents {
                if self.finished.contains(&dependent) {
                    continue;
                }
                if let Some(count) = self.indegree.get_mut(&dependent) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        self.ready.insert(dependent);
                    }
                }
            }
        }
    }

    /// True while unfinished ids remain.
    pub fn is_active(&self) -> bool {
        self.finished.len() < self.total
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
