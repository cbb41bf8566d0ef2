// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project registration and the per-project context cache.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A registered project. `name` is the unique key other entities reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub instructions: String,
    /// Mutable cache written by the agent through MCP `set_project_context`,
    /// read back on the next task's startup. Last-writer-wins.
    #[serde(default)]
    pub context: String,
}

impl Project {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            aliases: Vec::new(),
            instructions: String::new(),
            context: String::new(),
        }
    }

    pub fn matches(&self, name_or_alias: &str) -> bool {
        self.name == name_or_alias || self.aliases.iter().any(|a| a == name_or_alias)
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
