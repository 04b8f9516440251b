// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAG executor
//!
//! A single async coordinator walks the plan's topological ready-set and
//! dispatches artifact production to blocking workers, at most
//! `max_concurrency` at once. Ready artifacts dispatch in id order so runs
//! over the same plan log reproducibly. State is persisted after every
//! outcome; failures skip all transitive dependents and the run continues
//! on independent branches.

use crate::error::ExecuteError;
use crate::hash::runbook_hash;
use crate::produce::{produce_message, production_kind};
use crate::result::{ArtifactResult, ArtifactStatus, ExecutionResult};
use chrono::Utc;
use dm_core::{
    ArtifactId, Clock, ComponentRegistry, ExecutionContext, RunId, ServiceContainer, SystemClock,
};
use dm_planner::ExecutionPlan;
use dm_storage::{ArtifactStore, ExecutionState, RunMetadata, RunStateStore, RunStatus};
use std::collections::{BTreeMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Execution options
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Fixed run id (a fresh UUID v4 when absent)
    pub run_id: Option<RunId>,
    /// Continue a prior run: completed artifacts are not re-executed,
    /// failed and skipped sets are preserved
    pub resume_from: Option<RunId>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume_from(run_id: RunId) -> Self {
        Self {
            run_id: None,
            resume_from: Some(run_id),
        }
    }
}

/// Executes one plan against a store.
pub struct DagExecutor<S, C: Clock = SystemClock> {
    plan: Arc<ExecutionPlan>,
    registry: Arc<ComponentRegistry>,
    services: Arc<ServiceContainer>,
    store: Arc<S>,
    clock: C,
}

impl<S> DagExecutor<S, SystemClock>
where
    S: ArtifactStore + RunStateStore + 'static,
{
    pub fn new(
        plan: Arc<ExecutionPlan>,
        registry: Arc<ComponentRegistry>,
        services: Arc<ServiceContainer>,
        store: Arc<S>,
    ) -> Self {
        Self::with_clock(plan, registry, services, store, SystemClock)
    }
}

impl<S, C> DagExecutor<S, C>
where
    S: ArtifactStore + RunStateStore + 'static,
    C: Clock + 'static,
{
    pub fn with_clock(
        plan: Arc<ExecutionPlan>,
        registry: Arc<ComponentRegistry>,
        services: Arc<ServiceContainer>,
        store: Arc<S>,
        clock: C,
    ) -> Self {
        Self {
            plan,
            registry,
            services,
            store,
            clock,
        }
    }

    /// Execute the plan, returning the aggregated result.
    pub async fn execute(&self, options: ExecuteOptions) -> Result<ExecutionResult, ExecuteError> {
        let started_at = Utc::now();
        let hash = runbook_hash(self.plan.runbook())?;
        let ids = self.plan.ids();

        // Load-or-initialise run state
        let (run_id, mut state) = match options.resume_from {
            Some(previous) => {
                let metadata = self
                    .store
                    .load_metadata(&previous)?
                    .ok_or_else(|| ExecuteError::RunNotFound(previous.clone()))?;
                if metadata.status == RunStatus::Running {
                    return Err(ExecuteError::RunActive(previous));
                }
                if metadata.runbook_hash != hash {
                    return Err(ExecuteError::RunbookChanged { run_id: previous });
                }
                let state = self
                    .store
                    .load_state(&previous)?
                    .ok_or_else(|| ExecuteError::StateMissing {
                        run_id: previous.clone(),
                    })?;
                state
                    .validate_against(&ids)
                    .map_err(|message| ExecuteError::StateInvalid {
                        run_id: previous.clone(),
                        message,
                    })?;
                tracing::info!(
                    run_id = %previous,
                    completed = state.completed.len(),
                    failed = state.failed.len(),
                    skipped = state.skipped.len(),
                    "resuming run"
                );
                (previous, state)
            }
            None => {
                let run_id = options
                    .run_id
                    .unwrap_or_else(|| RunId::new(uuid::Uuid::new_v4().to_string()));
                (run_id, ExecutionState::new(ids.iter().cloned()))
            }
        };

        let mut metadata = RunMetadata::started(
            run_id.clone(),
            self.plan.runbook_path().display().to_string(),
            hash,
        );
        self.store.save_metadata(&metadata)?;
        self.store.save_state(&run_id, &state)?;
        tracing::info!(
            run_id = %run_id,
            artifacts = ids.len(),
            max_concurrency = self.plan.max_concurrency(),
            "run started"
        );

        // Seed the sorter with everything already decided
        let mut sorter = self.plan.dag().sorter();
        for id in state
            .completed
            .iter()
            .chain(state.failed.iter())
            .chain(state.skipped.iter())
        {
            sorter.done(id);
        }

        let max_concurrency = self.plan.max_concurrency().max(1);
        let deadline = self.plan.timeout().map(|timeout| self.clock.now() + timeout);
        let mut timed_out = false;

        let mut durations: BTreeMap<ArtifactId, f64> = BTreeMap::new();
        let mut errors: BTreeMap<ArtifactId, String> = BTreeMap::new();
        let mut queue: VecDeque<ArtifactId> = VecDeque::new();
        let mut in_flight: JoinSet<(ArtifactId, Result<f64, String>)> = JoinSet::new();
        let mut running = 0usize;

        loop {
            // get_ready yields sorted ids; dispatch order is deterministic
            for id in sorter.get_ready() {
                queue.push_back(id);
            }

            if !timed_out {
                if let Some(deadline) = deadline {
                    if self.clock.now() >= deadline {
                        timed_out = true;
                        tracing::warn!(
                            run_id = %run_id,
                            pending = queue.len(),
                            "run timeout reached, draining in-flight work"
                        );
                    }
                }
            }

            if !timed_out {
                while running < max_concurrency {
                    let Some(id) = queue.pop_front() else {
                        break;
                    };
                    running += 1;
                    let worker = Worker {
                        plan: Arc::clone(&self.plan),
                        registry: Arc::clone(&self.registry),
                        services: Arc::clone(&self.services),
                        store: Arc::clone(&self.store),
                        run_id: run_id.clone(),
                        id,
                        clock: self.clock.clone(),
                    };
                    in_flight.spawn_blocking(move || worker.run());
                }
            }

            if in_flight.is_empty() {
                // Nothing running: the plan is drained, the timeout fired,
                // or every remaining id is already decided
                break;
            }

            let (id, outcome) = match in_flight.join_next().await {
                Some(Ok(pair)) => pair,
                Some(Err(join_error)) => return Err(ExecuteError::Join(join_error.to_string())),
                None => break,
            };
            running -= 1;

            match outcome {
                Ok(duration) => {
                    state.mark_completed(&id);
                    durations.insert(id.clone(), duration);
                    sorter.done(&id);
                }
                Err(error) => {
                    let definition = self.plan.artifact(&id);
                    let optional = definition.map(|d| d.optional).unwrap_or(false);
                    if optional {
                        tracing::warn!(
                            run_id = %run_id,
                            artifact_id = %id,
                            origin = %self.plan.origin(&id),
                            error = %error,
                            "optional artifact failed"
                        );
                    } else {
                        tracing::error!(
                            run_id = %run_id,
                            artifact_id = %id,
                            origin = %self.plan.origin(&id),
                            error = %error,
                            "artifact production failed"
                        );
                    }
                    state.mark_failed(&id);
                    errors.insert(id.clone(), error);

                    // Skip all transitive dependents before releasing the
                    // failed id, so none of them ever becomes ready
                    for dependent in self.plan.dag().transitive_dependents(&id) {
                        if state.mark_skipped(&dependent) {
                            sorter.done(&dependent);
                        }
                    }
                    sorter.done(&id);
                }
            }

            self.store.save_state(&run_id, &state)?;
        }

        // Finalise
        let failed_required = state.failed.iter().any(|id| {
            self.plan
                .artifact(id)
                .map(|definition| !definition.optional)
                .unwrap_or(true)
        });
        let (status, reason) = if timed_out {
            (RunStatus::Failed, Some("timeout".to_string()))
        } else if failed_required {
            (RunStatus::Failed, Some("artifact failures".to_string()))
        } else {
            (RunStatus::Completed, None)
        };
        metadata.finish(status, reason.clone());
        self.store.save_state(&run_id, &state)?;
        self.store.save_metadata(&metadata)?;
        tracing::info!(
            run_id = %run_id,
            status = ?status,
            completed = state.completed.len(),
            failed = state.failed.len(),
            skipped = state.skipped.len(),
            "run finished"
        );

        // Aggregate the result
        let mut artifacts: BTreeMap<ArtifactId, ArtifactResult> = BTreeMap::new();
        for id in &ids {
            let artifact_status = if state.completed.contains(id) {
                ArtifactStatus::Completed
            } else if state.failed.contains(id) {
                ArtifactStatus::Failed
            } else if state.skipped.contains(id) {
                ArtifactStatus::Skipped
            } else {
                // Never started (timeout)
                continue;
            };
            let definition = self.plan.artifact(id);
            artifacts.insert(
                id.clone(),
                ArtifactResult {
                    status: artifact_status,
                    origin: self.plan.origin(id),
                    alias: self.plan.alias_of(id).map(String::from),
                    error: errors.get(id).cloned(),
                    duration_seconds: durations.get(id).copied(),
                    output: definition.map(|d| d.output).unwrap_or(false),
                    optional: definition.map(|d| d.optional).unwrap_or(false),
                },
            );
        }

        Ok(ExecutionResult {
            run_id,
            status,
            reason,
            artifacts,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// One artifact production on a blocking worker thread.
struct Worker<S, C: Clock> {
    plan: Arc<ExecutionPlan>,
    registry: Arc<ComponentRegistry>,
    services: Arc<ServiceContainer>,
    store: Arc<S>,
    run_id: RunId,
    id: ArtifactId,
    clock: C,
}

impl<S, C> Worker<S, C>
where
    S: ArtifactStore + RunStateStore,
    C: Clock,
{
    fn run(self) -> (ArtifactId, Result<f64, String>) {
        let start = self.clock.now();
        if let Some(definition) = self.plan.artifact(&self.id) {
            tracing::debug!(
                run_id = %self.run_id,
                artifact_id = %self.id,
                kind = production_kind(definition),
                "producing artifact"
            );
        }

        // Component panics are contained like any other failure
        let produced = catch_unwind(AssertUnwindSafe(|| {
            produce_message(
                self.plan.as_ref(),
                self.registry.as_ref(),
                self.services.as_ref(),
                self.store.as_ref(),
                &self.run_id,
                &self.id,
            )
        }))
        .unwrap_or_else(|_| Err("component panicked".to_string()));

        let message = match produced {
            Ok(message) => message,
            Err(error) => return (self.id, Err(error)),
        };

        let elapsed = (self.clock.now() - start).as_secs_f64();
        let context = ExecutionContext::success(self.plan.origin(&self.id))
            .with_alias(self.plan.alias_of(&self.id).map(String::from))
            .with_duration(elapsed);
        let mut message = message.with_execution(context);
        message.id = self.id.to_string();

        match self.store.save(&self.run_id, self.id.as_str(), &message) {
            Ok(()) => (self.id, Ok(elapsed)),
            Err(error) => (self.id, Err(error.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "executor_tests/mod.rs"]
mod tests;
