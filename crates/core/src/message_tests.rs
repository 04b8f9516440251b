// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn origin_serializes_textually() {
    assert_eq!(serde_json::to_string(&Origin::Parent).unwrap(), "\"parent\"");
    assert_eq!(
        serde_json::to_string(&Origin::Child("pii_scan".into())).unwrap(),
        "\"child:pii_scan\""
    );
}

#[test]
fn origin_deserializes_textually() {
    let parent: Origin = serde_json::from_str("\"parent\"").unwrap();
    assert_eq!(parent, Origin::Parent);
    let child: Origin = serde_json::from_str("\"child:pii_scan\"").unwrap();
    assert_eq!(child, Origin::Child("pii_scan".into()));
}

#[test]
fn origin_rejects_unknown_forms() {
    assert!(serde_json::from_str::<Origin>("\"grandparent\"").is_err());
    assert!(serde_json::from_str::<Origin>("\"child:\"").is_err());
}

#[test]
fn message_roundtrips_through_json() {
    let msg = Message::new(
        "src",
        json!([{"path": "a.txt", "text": "hello"}]),
        Schema::new("standard_input", "1.0.0"),
    )
    .with_execution(
        ExecutionContext::success(Origin::Parent)
            .with_alias(Some("analysis".into()))
            .with_duration(0.25),
    );

    let text = serde_json::to_string_pretty(&msg).unwrap();
    let back: Message = serde_json::from_str(&text).unwrap();
    assert_eq!(back, msg);
    assert_eq!(back.schema.to_string(), "standard_input/1.0.0");
}

#[test]
fn message_without_extensions_deserializes() {
    let text = r#"{"id": "x", "content": 1, "schema": "finding/1.0.0"}"#;
    let msg: Message = serde_json::from_str(text).unwrap();
    assert!(msg.execution().is_none());
    assert!(msg.extensions.extra.is_empty());
}

#[test]
fn unknown_extensions_roundtrip_untouched() {
    let text = r#"{
        "id": "x",
        "content": null,
        "schema": "finding/1.0.0",
        "extensions": {"provenance": {"tool": "scanner"}}
    }"#;
    let msg: Message = serde_json::from_str(text).unwrap();
    assert_eq!(msg.extensions.extra["provenance"]["tool"], "scanner");

    let back: Message =
        serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn with_execution_replaces_prior_context() {
    let msg = Message::new("x", json!(null), Schema::new("a", "1"))
        .with_execution(ExecutionContext::success(Origin::Parent));
    let msg = msg.with_execution(
        ExecutionContext::success(Origin::Child("c".into())).with_duration(1.5),
    );
    let ctx = msg.execution().unwrap();
    assert_eq!(ctx.origin, Origin::Child("c".into()));
    assert_eq!(ctx.duration_seconds, Some(1.5));
}
