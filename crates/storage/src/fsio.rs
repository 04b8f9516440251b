// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file writes: write-temp, fsync, rename, fsync directory.
//!
//! A reader sees either the previous file or the new one, never a torn
//! write, and a crash never leaves a partial state file behind under the
//! final name.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent();
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;

    // Make the rename durable
    if let Some(parent) = parent {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

/// Whether a directory entry name is a leftover temp file.
pub(crate) fn is_tmp_name(name: &str) -> bool {
    name.ends_with(".tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value.json");

        write_atomic(&path, b"one").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"one");

        write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/value.json");
        write_atomic(&path, b"x").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value.json");
        write_atomic(&path, b"x").unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["value.json"]);
    }

    #[test]
    fn tmp_suffix_is_detected() {
        assert!(is_tmp_name("value.json.tmp"));
        assert!(!is_tmp_name("value.json"));
    }
}
