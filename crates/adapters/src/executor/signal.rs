// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process suspend/resume via `kill -STOP`/`kill -CONT`, shared by every
//! executor variant. Suspending the pane's foreground pid freezes an agent
//! mid-turn without tearing down its session, so reconnecting later resumes
//! exactly where it left off.

use crate::subprocess::{run_with_timeout, SHELL_EVAL_TIMEOUT};
use tokio::process::Command;

pub async fn stop(pid: u32) -> Result<(), String> {
    let mut cmd = Command::new("kill");
    cmd.args(["-STOP", &pid.to_string()]);
    let output = run_with_timeout(cmd, SHELL_EVAL_TIMEOUT, "kill -STOP").await?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).to_string());
    }
    Ok(())
}

pub async fn cont(pid: u32) -> Result<(), String> {
    let mut cmd = Command::new("kill");
    cmd.args(["-CONT", &pid.to_string()]);
    let output = run_with_timeout(cmd, SHELL_EVAL_TIMEOUT, "kill -CONT").await?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).to_string());
    }
    Ok(())
}

/// Whether the process is currently stopped, per `/proc/<pid>/stat`'s state
/// field (`T`). Unix-only; on platforms without `/proc` this always reports
/// `false` rather than failing the caller.
pub fn is_stopped(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Fields after the (comm) parenthetical can contain spaces, so find the
    // state field by locating the closing paren first.
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state == "T")
}
