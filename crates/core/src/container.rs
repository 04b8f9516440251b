// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service container for singleton infrastructure services
//!
//! A typed, lazy, lifetime-aware registry. Services are registered per
//! execution and passed explicitly; there is no process-global container.
//! An unavailable factory (`can_create()` false) resolves to `Ok(None)` so
//! consumers can degrade gracefully instead of failing the run.

use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from service resolution
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service creation failed: {0}")]
    Creation(String),
    #[error("registered factory produced a value of the wrong type for {type_name}")]
    TypeMismatch { type_name: &'static str },
}

/// Service lifetime: cached after first creation, or created per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Singleton,
    Transient,
}

/// Creates service values of type `T`.
///
/// Factories receive their configuration at construction, not at `create`.
/// `T` is the resolved handle (typically an `Arc<dyn Trait>`), so cloning
/// a cached singleton is cheap.
pub trait ServiceFactory<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Whether the service can be created in this environment (e.g. the
    /// required API key is present). Checked before every `create`.
    fn can_create(&self) -> bool {
        true
    }

    fn create(&self) -> Result<T, ServiceError>;
}

type ErasedCreate = Box<dyn Fn() -> Result<Box<dyn Any + Send + Sync>, ServiceError> + Send + Sync>;

struct Registration {
    lifetime: Lifetime,
    can_create: Box<dyn Fn() -> bool + Send + Sync>,
    create: ErasedCreate,
}

/// Registers and lazily resolves services by type.
///
/// Re-registering a type replaces the prior registration and drops any
/// cached singleton. Resolution is safe to call concurrently.
#[derive(Default)]
pub struct ServiceContainer {
    registrations: HashMap<TypeId, Registration>,
    singletons: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `T` with the given lifetime.
    pub fn register<T, F>(&mut self, lifetime: Lifetime, factory: F)
    where
        T: Clone + Send + Sync + 'static,
        F: ServiceFactory<T> + 'static,
    {
        let factory = std::sync::Arc::new(factory);
        let create_factory = std::sync::Arc::clone(&factory);
        let registration = Registration {
            lifetime,
            can_create: Box::new(move || factory.can_create()),
            create: Box::new(move || {
                create_factory
                    .create()
                    .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
        };
        self.singletons.lock().remove(&TypeId::of::<T>());
        self.registrations.insert(TypeId::of::<T>(), registration);
    }

    /// Resolve a service.
    ///
    /// Returns `Ok(None)` when no factory is registered or the factory
    /// reports itself unavailable. A creation failure propagates as `Err`.
    pub fn get<T>(&self) -> Result<Option<T>, ServiceError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let Some(registration) = self.registrations.get(&TypeId::of::<T>()) else {
            return Ok(None);
        };
        if !(registration.can_create)() {
            return Ok(None);
        }

        match registration.lifetime {
            Lifetime::Transient => {
                let value = (registration.create)()?;
                Ok(Some(downcast::<T>(value)?))
            }
            Lifetime::Singleton => {
                let mut cache = self.singletons.lock();
                if let Some(cached) = cache.get(&TypeId::of::<T>()) {
                    let value = cached
                        .downcast_ref::<T>()
                        .cloned()
                        .ok_or(ServiceError::TypeMismatch {
                            type_name: std::any::type_name::<T>(),
                        })?;
                    return Ok(Some(value));
                }
                let value = downcast::<T>((registration.create)()?)?;
                cache.insert(TypeId::of::<T>(), Box::new(value.clone()));
                Ok(Some(value))
            }
        }
    }

    /// Whether a factory is registered for `T` (regardless of availability).
    pub fn contains<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }
}

fn downcast<T: Clone + Send + Sync + 'static>(
    value: Box<dyn Any + Send + Sync>,
) -> Result<T, ServiceError> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| ServiceError::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        })
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
