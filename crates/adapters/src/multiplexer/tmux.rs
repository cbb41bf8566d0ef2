// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tmux-backed multiplexer adapter

use super::{MultiplexerAdapter, MultiplexerError};
use crate::subprocess::{run_with_timeout, MULTIPLEXER_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// tmux-based multiplexer adapter. Window ids are tmux session names
/// prefixed with `ty-` so they're easy to spot in `tmux ls`.
#[derive(Clone, Default)]
pub struct TmuxMultiplexerAdapter;

impl TmuxMultiplexerAdapter {
    pub fn new() -> Self {
        Self
    }
}

async fn run(description: &str, cmd: Command) -> Result<std::process::Output, MultiplexerError> {
    run_with_timeout(cmd, MULTIPLEXER_TIMEOUT, description)
        .await
        .map_err(MultiplexerError::CommandFailed)
}

#[async_trait]
impl MultiplexerAdapter for TmuxMultiplexerAdapter {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MultiplexerError> {
        if !cwd.exists() {
            return Err(MultiplexerError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let window_id = format!("ty-{name}");

        let has_session = Command::new("tmux")
            .args(["has-session", "-t", &window_id])
            .output()
            .await;
        if has_session.map(|o| o.status.success()).unwrap_or(false) {
            tracing::warn!(window_id, "window already exists, killing first");
            let _ = Command::new("tmux")
                .args(["kill-session", "-t", &window_id])
                .output()
                .await;
        }

        let mut tmux_cmd = Command::new("tmux");
        tmux_cmd
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(&window_id)
            .arg("-c")
            .arg(cwd);
        for (key, value) in env {
            tmux_cmd.arg("-e").arg(format!("{key}={value}"));
        }
        tmux_cmd.arg(cmd);

        let output = run("tmux new-session", tmux_cmd).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(window_id, stderr = %stderr, "tmux spawn failed");
            return Err(MultiplexerError::SpawnFailed(stderr.to_string()));
        }

        Ok(window_id)
    }

    async fn send(&self, id: &str, input: &str) -> Result<(), MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", id, input]);
        let output = run("tmux send-keys", cmd).await?;
        if !output.status.success() {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn send_literal(&self, id: &str, text: &str) -> Result<(), MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", id, "-l", "--", text]);
        let output = run("tmux send-keys -l", cmd).await?;
        if !output.status.success() {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn send_enter(&self, id: &str) -> Result<(), MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", id, "Enter"]);
        let output = run("tmux send-keys Enter", cmd).await?;
        if !output.status.success() {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn kill(&self, id: &str) -> Result<(), MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["kill-session", "-t", id]);
        // Session might already be dead; that's not an error.
        let _ = run("tmux kill-session", cmd).await;
        Ok(())
    }

    async fn is_alive(&self, id: &str) -> Result<bool, MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["has-session", "-t", id]);
        let output = run("tmux has-session", cmd).await?;
        Ok(output.status.success())
    }

    async fn capture_output(&self, id: &str, lines: u32) -> Result<String, MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["capture-pane", "-t", id, "-p", "-S", &format!("-{lines}")]);
        let output = run("tmux capture-pane", cmd).await?;
        if !output.status.success() {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, MultiplexerError> {
        let Some(pid) = self.get_pid(id).await? else {
            return Ok(false);
        };

        let (ps_output, pgrep_output) = tokio::try_join!(
            run(
                "ps",
                { let mut c = Command::new("ps"); c.args(["-p", &pid.to_string(), "-o", "command="]); c },
            ),
            run(
                "pgrep",
                { let mut c = Command::new("pgrep"); c.args(["-P", &pid.to_string(), "-f", pattern]); c },
            ),
        )?;

        if ps_output.status.success() {
            let cmd_line = String::from_utf8_lossy(&ps_output.stdout);
            if cmd_line.contains(pattern) {
                return Ok(true);
            }
        }
        Ok(pgrep_output.status.success())
    }

    async fn get_pid(&self, id: &str) -> Result<Option<u32>, MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["list-panes", "-t", id, "-F", "#{pane_pid}"]);
        let output = run("tmux list-panes", cmd).await?;
        if !output.status.success() {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        let pid_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(pid_str.parse::<u32>().ok())
    }

    async fn get_exit_code(&self, id: &str) -> Result<Option<i32>, MultiplexerError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["display-message", "-t", id, "-p", "#{pane_dead_status}"]);
        let output = run("tmux display-message", cmd).await?;
        if !output.status.success() {
            return Err(MultiplexerError::NotFound(id.to_string()));
        }
        let status_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if status_str.is_empty() {
            return Ok(None);
        }
        Ok(status_str.parse::<i32>().ok())
    }

    async fn configure(
        &self,
        id: &str,
        config: &serde_json::Value,
    ) -> Result<(), MultiplexerError> {
        if let Some(title) = config.get("title").and_then(|v| v.as_str()) {
            let mut set_titles = Command::new("tmux");
            set_titles.args(["set-option", "-t", id, "set-titles", "on"]);
            let _ = run("tmux set-option", set_titles).await;

            let mut set_title = Command::new("tmux");
            set_title.args(["set-option", "-t", id, "set-titles-string", title]);
            let _ = run("tmux set-option", set_title).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
