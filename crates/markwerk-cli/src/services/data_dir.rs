// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

use markwerk_core::error::Result;

/// Environment variable that overrides the data directory outright.
pub const DATA_DIR_ENV: &str = "MARKWERK_DATA_DIR";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> Result<PathBuf> {
    let dir = resolve(|name| std::env::var(name).ok());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Pick the data directory from the environment without touching the disk.
///
/// Order: `MARKWERK_DATA_DIR`, then `$XDG_DATA_HOME/markwerk`, then
/// `$HOME/.local/share/markwerk`, then the temp directory.
fn resolve(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    let non_empty = |name: &str| env(name).filter(|v| !v.is_empty());

    if let Some(dir) = non_empty(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let base = if let Some(xdg) = non_empty("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = non_empty("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        std::env::temp_dir()
    };
    base.join("markwerk")
}
