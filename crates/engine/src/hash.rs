// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbook hashing for resume integrity
//!
//! The hash covers the canonical JSON serialisation of the parsed parent
//! model (post env-substitution), so formatting-only edits do not
//! invalidate resume. Child runbooks are intentionally not hashed.

use dm_runbook::Runbook;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// SHA-256 hex digest of the canonicalised runbook.
pub fn runbook_hash(runbook: &Runbook) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_vec(runbook)?;
    let digest = Sha256::digest(&canonical);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_runbook::parse_runbook_str;

    const RUNBOOK: &str = r#"
name: audit
description: t
artifacts:
  src:
    source: {type: file, properties: {path: /data}}
"#;

    #[test]
    fn hash_is_stable_across_parses() {
        let a = runbook_hash(&parse_runbook_str(RUNBOOK).unwrap()).unwrap();
        let b = runbook_hash(&parse_runbook_str(RUNBOOK).unwrap()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn formatting_only_changes_keep_the_hash() {
        let reformatted = r#"
name: audit
description: t
artifacts:
  src:
    source:
      type: file
      properties:
        path: /data
"#;
        let a = runbook_hash(&parse_runbook_str(RUNBOOK).unwrap()).unwrap();
        let b = runbook_hash(&parse_runbook_str(reformatted).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn semantic_changes_change_the_hash() {
        let changed = RUNBOOK.replace("/data", "/exports");
        let a = runbook_hash(&parse_runbook_str(RUNBOOK).unwrap()).unwrap();
        let b = runbook_hash(&parse_runbook_str(&changed).unwrap()).unwrap();
        assert_ne!(a, b);
    }
}
