// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{ArtifactId, RunId};

#[test]
fn uuid_gen_produces_unique_ids() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn sequential_gen_counts_up() {
    let gen = SequentialIdGen::new("run");
    assert_eq!(gen.next(), "run-1");
    assert_eq!(gen.next(), "run-2");
}

#[test]
fn sequential_gen_clones_share_counter() {
    let gen = SequentialIdGen::new("x");
    let clone = gen.clone();
    assert_eq!(gen.next(), "x-1");
    assert_eq!(clone.next(), "x-2");
}

#[test]
fn short_truncates() {
    let id = RunId::new("abcdef123456");
    assert_eq!(id.short(6), "abcdef");
    assert_eq!(id.short(100), "abcdef123456");
    assert_eq!("abc".short(2), "ab");
}

#[test]
fn id_equality_with_str() {
    let id = ArtifactId::new("src");
    assert_eq!(id, "src");
    assert_eq!(id, *"src");
    assert_eq!(id.to_string(), "src");
}

#[test]
fn ids_order_lexicographically() {
    let mut ids = vec![
        ArtifactId::new("c"),
        ArtifactId::new("a"),
        ArtifactId::new("b"),
    ];
    ids.sort();
    let names: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn namespace_token_is_short_hex() {
    let token = namespace_token();
    assert_eq!(token.len(), 8);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn namespace_tokens_differ() {
    assert_ne!(namespace_token(), namespace_token());
}

#[test]
fn id_serde_roundtrip_as_plain_string() {
    let id = ArtifactId::new("child__abc123__findings");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"child__abc123__findings\"");
    let back: ArtifactId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
