// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the behavioral specs.

use dm_components::fake::{FakeAnalyserFactory, FakeConnectorFactory};
use dm_core::{ArtifactId, ComponentRegistry, ServiceContainer};
use dm_engine::{ArtifactStatus, DagExecutor, ExecuteOptions, ExecutionResult};
use dm_planner::{ExecutionPlan, PlanError, Planner};
use dm_storage::FsArtifactStore;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A scratch project directory holding runbook files and run storage.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn store(&self) -> Arc<FsArtifactStore> {
        Arc::new(FsArtifactStore::new(self.dir.path().join("state")))
    }

    pub fn plan(
        &self,
        registry: &ComponentRegistry,
        runbook_file: &str,
    ) -> Result<ExecutionPlan, PlanError> {
        Planner::new(registry).plan(&self.dir.path().join(runbook_file))
    }

    pub fn plan_ok(&self, registry: &ComponentRegistry, runbook_file: &str) -> Arc<ExecutionPlan> {
        Arc::new(self.plan(registry, runbook_file).expect("plan compiles"))
    }
}

pub async fn execute(
    registry: &ComponentRegistry,
    plan: &Arc<ExecutionPlan>,
    store: &Arc<FsArtifactStore>,
    options: ExecuteOptions,
) -> ExecutionResult {
    DagExecutor::new(
        Arc::clone(plan),
        Arc::new(registry.clone()),
        Arc::new(ServiceContainer::new()),
        Arc::clone(store),
    )
    .execute(options)
    .await
    .expect("run executes")
}

/// Registry with the standard spec fixtures: an `fs` connector emitting
/// one record and a `classifier`/`personal_data` analyser pair.
pub fn spec_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("fs")
            .with_content(json!([{"path": "/data/users.csv", "text": "alice@example.com"}])),
    ));
    registry.register_analyser(Arc::new(FakeAnalyserFactory::classifier("classifier")));
    registry.register_analyser(Arc::new(FakeAnalyserFactory::classifier("personal_data")));
    registry
}

pub fn id(s: &str) -> ArtifactId {
    ArtifactId::new(s)
}

pub fn status_of(result: &ExecutionResult, artifact: &str) -> ArtifactStatus {
    result.artifacts[&id(artifact)].status
}
