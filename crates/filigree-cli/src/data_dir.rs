// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "filigree";

/// Return the data directory, creating it if needed.
///
/// An explicit directory (from `--data-dir` or `FILIGREE_DATA_DIR`) is used
/// as is; otherwise a `filigree` directory under the XDG data home.
pub fn data_dir(explicit: Option<&Path>) -> std::io::Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => base_dir(|name| std::env::var(name).ok()).join(APP_DIR),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn base_dir(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(xdg) = var("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = var("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    PathBuf::from("/tmp")
}
