// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

/// Directory name under the platform data root.
const APP_DIR: &str = "pdftools";

/// Return the application data directory, creating it if needed.
///
/// Resolution order: `$XDG_DATA_HOME`, `$HOME/.local/share`, then `/tmp`.
/// On Android the hosting app points `HOME` at its files directory.
pub fn data_dir() -> PathBuf {
    let dir = base_dir().join(APP_DIR);
    ensure(&dir);
    dir
}

/// Return a subdirectory inside `root` (e.g. "exports"), creating it if
/// needed.
pub fn data_subdir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    ensure(&dir);
    dir
}

fn ensure(dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!(path = %dir.display(), error = %e, "could not create data directory");
    }
}

fn base_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdir_is_created_under_root() {
        let root = tempfile::tempdir().unwrap();
        let exports = data_subdir(root.path(), "exports");
        assert!(exports.is_dir());
        assert_eq!(exports, root.path().join("exports"));
    }
}
