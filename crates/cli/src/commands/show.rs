// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty show` - show a single task's detail.

use anyhow::{anyhow, Result};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

pub async fn handle(client: &DaemonClient, id: u64, include_logs: bool, format: OutputFormat) -> Result<()> {
    let task = client
        .show(id, include_logs)
        .await?
        .ok_or_else(|| anyhow!(ExitError::new(1, format!("task {id} not found"))))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&task)?),
        OutputFormat::Text => {
            let s = &task.summary;
            println!("{}", crate::color::header(&format!("#{} {}", s.id, s.title)));
            println!("status:    {}", crate::color::status(&s.status));
            println!("project:   {}", s.project);
            println!("executor:  {}", s.executor);
            if let Some(kind) = &s.kind {
                println!("kind:      {kind}");
            }
            println!("pinned:    {}", s.pinned);
            println!("created:   {}", s.created_at);
            println!("updated:   {}", s.updated_at);
            if let Some(path) = &task.worktree_path {
                println!("worktree:  {path}");
            }
            if let Some(branch) = &task.branch_name {
                println!("branch:    {branch}");
            }
            if let Some(port) = task.port {
                println!("port:      {port}");
            }
            if let Some(sched) = task.scheduled_at {
                println!("scheduled: {sched}");
            }
            if let Some(rec) = &task.recurrence {
                println!("recurs:    {rec}");
            }
            println!("retries:   {}", task.total_retries);
            if !task.body.is_empty() {
                println!("\n{}", task.body);
            }
            if let Some(summary) = &task.task_summary {
                println!("\n{}", crate::color::muted(summary));
            }
            if include_logs && !task.logs.is_empty() {
                println!("\n{}", crate::color::header("logs"));
                for line in &task.logs {
                    println!("[{}] {}: {}", line.created_at.format("%H:%M:%S"), line.line_type, line.content);
                }
            }
        }
    }

    Ok(())
}
