// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-wide configuration. Threaded explicitly into every component that
//! needs it (Worktree Manager, Executor Supervisor, Scheduler, Event
//! Manager) rather than read from a package-level singleton, per SPEC_FULL's
//! design note against global state. Grounded on the teacher's layered
//! `Config::load()` (`daemon/src/lifecycle.rs`): fixed defaults under the
//! state dir, overridable by a `config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_concurrency() -> usize {
    1
}

fn default_idle_minutes() -> u64 {
    10
}

fn default_port_range_start() -> u16 {
    3100
}

fn default_port_range_end() -> u16 {
    4099
}

fn default_webhook_queue_depth() -> usize {
    256
}

/// On-disk overlay read from `<config_dir>/config.toml`. Every field has a
/// default matching SPEC_FULL's operator-configurable knobs, so an absent
/// or partial file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub concurrency: usize,
    pub idle_minutes: u64,
    pub port_range_start: u16,
    pub port_range_end: u16,
    pub webhook_queue_depth: usize,
    pub default_executor: String,
    pub default_branch: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            idle_minutes: default_idle_minutes(),
            port_range_start: default_port_range_start(),
            port_range_end: default_port_range_end(),
            webhook_queue_depth: default_webhook_queue_depth(),
            default_executor: "claude".to_string(),
            default_branch: "main".to_string(),
        }
    }
}

/// Fully resolved engine configuration, with every path made absolute under
/// `data_dir`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub worktrees_dir: PathBuf,
    pub hooks_dir: PathBuf,
    pub webhooks_path: PathBuf,
    pub concurrency: usize,
    pub idle_minutes: u64,
    pub port_range: (u16, u16),
    pub webhook_queue_depth: usize,
    pub default_executor: String,
    pub default_branch: String,
}

impl EngineConfig {
    /// Load `data_dir/config.toml` if present, falling back to defaults for
    /// any field it omits or if the file doesn't exist.
    pub fn load(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let overlay = Self::read_overlay(&data_dir.join("config.toml")).unwrap_or_default();
        Self {
            worktrees_dir: data_dir.join("worktrees"),
            hooks_dir: data_dir.join("hooks"),
            webhooks_path: data_dir.join("webhooks.json"),
            concurrency: overlay.concurrency.max(1),
            idle_minutes: overlay.idle_minutes.max(1),
            port_range: (overlay.port_range_start, overlay.port_range_end),
            webhook_queue_depth: overlay.webhook_queue_depth.max(1),
            default_executor: overlay.default_executor,
            default_branch: overlay.default_branch,
            data_dir,
        }
    }

    fn read_overlay(path: &Path) -> Option<ConfigFile> {
        let raw = std::fs::read_to_string(path).ok()?;
        toml::from_str(&raw).ok()
    }

    pub fn idle_threshold(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.idle_minutes as i64)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
