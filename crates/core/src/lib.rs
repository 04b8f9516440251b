// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dm-core: Core library for the Datamap (dm) compliance-analysis engine

pub mod clock;
pub mod container;
pub mod id;
pub mod llm;
pub mod message;
pub mod registry;
pub mod schema;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use container::{Lifetime, ServiceContainer, ServiceError, ServiceFactory};
pub use id::{namespace_token, IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use llm::{LlmClient, LlmError, LlmRequest, LlmResponse};
pub use message::{ExecutionContext, ExecutionStatus, Extensions, Message, Origin};
pub use registry::{
    Analyser, AnalyserFactory, ComponentError, ComponentRegistry, Connector, ConnectorFactory,
    Properties,
};
pub use schema::{InputRequirement, Schema, SchemaParseError};

crate::define_id! {
    /// Identifier for a single run of an execution plan (UUID v4 in production).
    pub struct RunId;
}

crate::define_id! {
    /// Identifier for an artifact after flattening (possibly namespaced).
    pub struct ArtifactId;
}
