// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counting factory for a cloneable handle type.
struct CountingFactory {
    calls: Arc<AtomicUsize>,
    available: Arc<AtomicBool>,
    fail: bool,
}

impl CountingFactory {
    fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let available = Arc::new(AtomicBool::new(true));
        (
            Self {
                calls: Arc::clone(&calls),
                available: Arc::clone(&available),
                fail: false,
            },
            calls,
            available,
        )
    }
}

impl ServiceFactory<Arc<String>> for CountingFactory {
    fn can_create(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn create(&self) -> Result<Arc<String>, ServiceError> {
        if self.fail {
            return Err(ServiceError::Creation("boom".into()));
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Arc::new(format!("instance-{}", n)))
    }
}

#[test]
fn unregistered_type_resolves_to_none() {
    let container = ServiceContainer::new();
    let value: Option<Arc<String>> = container.get().unwrap();
    assert!(value.is_none());
}

#[test]
fn singleton_is_created_once_and_cached() {
    let (factory, calls, _) = CountingFactory::new();
    let mut container = ServiceContainer::new();
    container.register(Lifetime::Singleton, factory);

    let a: Arc<String> = container.get().unwrap().unwrap();
    let b: Arc<String> = container.get().unwrap().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*a, "instance-1");
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn transient_creates_each_time() {
    let (factory, calls, _) = CountingFactory::new();
    let mut container = ServiceContainer::new();
    container.register(Lifetime::Transient, factory);

    let a: Arc<String> = container.get().unwrap().unwrap();
    let b: Arc<String> = container.get().unwrap().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_ne!(*a, *b);
}

#[test]
fn unavailable_factory_resolves_to_none_without_creating() {
    let (factory, calls, available) = CountingFactory::new();
    available.store(false, Ordering::SeqCst);
    let mut container = ServiceContainer::new();
    container.register(Lifetime::Singleton, factory);

    let value: Option<Arc<String>> = container.get().unwrap();
    assert!(value.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn availability_is_rechecked_after_becoming_available() {
    let (factory, _, available) = CountingFactory::new();
    available.store(false, Ordering::SeqCst);
    let mut container = ServiceContainer::new();
    container.register(Lifetime::Singleton, factory);

    assert!(container.get::<Arc<String>>().unwrap().is_none());

    available.store(true, Ordering::SeqCst);
    assert!(container.get::<Arc<String>>().unwrap().is_some());
}

#[test]
fn creation_failure_propagates_as_error() {
    let (mut factory, _, _) = CountingFactory::new();
    factory.fail = true;
    let mut container = ServiceContainer::new();
    container.register(Lifetime::Singleton, factory);

    let err = container.get::<Arc<String>>().unwrap_err();
    assert!(err.to_string().contains("boom"));
}

#[test]
fn reregistration_replaces_factory_and_drops_cached_singleton() {
    let (first, first_calls, _) = CountingFactory::new();
    let mut container = ServiceContainer::new();
    container.register(Lifetime::Singleton, first);
    let _: Arc<String> = container.get().unwrap().unwrap();
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);

    let (second, second_calls, _) = CountingFactory::new();
    container.register(Lifetime::Singleton, second);
    let value: Arc<String> = container.get().unwrap().unwrap();

    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*value, "instance-1");
}

#[test]
fn distinct_types_are_isolated() {
    struct UnitFactory;
    impl ServiceFactory<Arc<u64>> for UnitFactory {
        fn create(&self) -> Result<Arc<u64>, ServiceError> {
            Ok(Arc::new(7))
        }
    }

    let (strings, _, _) = CountingFactory::new();
    let mut container = ServiceContainer::new();
    container.register(Lifetime::Singleton, strings);
    container.register(Lifetime::Singleton, UnitFactory);

    assert!(container.contains::<Arc<String>>());
    assert!(container.contains::<Arc<u64>>());
    let n: Arc<u64> = container.get().unwrap().unwrap();
    assert_eq!(*n, 7);
}
