// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrency bounds: never more than max_concurrency components at
//! once; max_concurrency = 1 is strictly sequential.

use super::*;
use dm_components::fake::{ConcurrencyGauge, FakeConnectorFactory};
use serde_json::json;
use std::time::Duration;

fn delayed_registry(gauge: &ConcurrencyGauge, names: &[&str]) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    for name in names {
        registry.register_connector(Arc::new(
            FakeConnectorFactory::standard(name)
                .with_content(json!([1]))
                .with_delay(Duration::from_millis(30))
                .with_gauge(gauge),
        ));
    }
    registry
}

fn four_sources(concurrency: usize) -> String {
    format!(
        r#"
name: t
description: t
config:
  max_concurrency: {concurrency}
artifacts:
  a:
    source: {{type: c1}}
  b:
    source: {{type: c2}}
  c:
    source: {{type: c3}}
  d:
    source: {{type: c4}}
"#
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_the_bound() {
    let gauge = ConcurrencyGauge::new();
    let registry = delayed_registry(&gauge, &["c1", "c2", "c3", "c4"]);
    let plan = plan_with(&registry, &four_sources(2));
    let store = Arc::new(MemoryStore::new());

    let result = run(&registry, &plan, &store).await;

    assert!(result.is_success());
    assert_eq!(result.completed().len(), 4);
    assert!(
        gauge.peak() <= 2,
        "observed {} concurrent components with max_concurrency 2",
        gauge.peak()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn max_concurrency_one_is_sequential() {
    let gauge = ConcurrencyGauge::new();
    let registry = delayed_registry(&gauge, &["c1", "c2", "c3", "c4"]);
    let plan = plan_with(&registry, &four_sources(1));
    let store = Arc::new(MemoryStore::new());

    let result = run(&registry, &plan, &store).await;

    assert!(result.is_success());
    assert_eq!(gauge.peak(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_branches_do_run_in_parallel() {
    let gauge = ConcurrencyGauge::new();
    let registry = delayed_registry(&gauge, &["c1", "c2", "c3", "c4"]);
    let plan = plan_with(&registry, &four_sources(4));
    let store = Arc::new(MemoryStore::new());

    run(&registry, &plan, &store).await;

    assert!(
        gauge.peak() >= 2,
        "expected some overlap with max_concurrency 4, peak was {}",
        gauge.peak()
    );
}
