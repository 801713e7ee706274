// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

const CONFIG_FILE: &str = "config.json";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix of the access link returned for every new watermark.
    pub link_base: String,
    /// Upper bound on the secret length in bytes.
    pub max_secret_len: usize,
    /// Record every create/read attempt in the audit trail.
    pub audit_enabled: bool,
    /// SQLite database file name, relative to the data directory.
    pub database_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            link_base: "/api/get-version".into(),
            max_secret_len: 4096,
            audit_enabled: true,
            database_file: "filigree.db".into(),
        }
    }
}

impl AppConfig {
    /// Load `config.json` from `data_dir`, if present and well-formed.
    pub fn load(data_dir: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(data_dir.join(CONFIG_FILE)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Write the configuration to `config.json` in `data_dir`.
    pub fn persist(&self, data_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(data_dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}
