// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Builtin connectors and analysers, plus the HTTP LLM service factory
//!
//! The engine discovers components through a prepopulated registry; this
//! crate provides the minimal builtin set (`literal` and `file` connectors,
//! the `regex_scan` analyser) and `register_builtins` to wire them up.

mod file;
mod literal;
mod llm;
mod regex_scan;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use file::FileConnectorFactory;
pub use literal::LiteralConnectorFactory;
pub use llm::{HttpLlmClient, LlmClientFactory, LLM_API_KEY_ENV};
pub use regex_scan::RegexScanAnalyserFactory;

use dm_core::ComponentRegistry;
use std::sync::Arc;

/// Name/version of the schema emitted by the builtin connectors.
pub const STANDARD_INPUT_SCHEMA: (&str, &str) = ("standard_input", "1.0.0");
/// Name/version of the schema emitted by `regex_scan`.
pub const FINDING_SCHEMA: (&str, &str) = ("finding", "1.0.0");

/// Register the builtin connector and analyser factories.
pub fn register_builtins(registry: &mut ComponentRegistry) {
    registry.register_connector(Arc::new(LiteralConnectorFactory));
    registry.register_connector(Arc::new(FileConnectorFactory));
    registry.register_analyser(Arc::new(RegexScanAnalyserFactory));
}
