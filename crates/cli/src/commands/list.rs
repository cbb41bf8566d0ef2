// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty list` - list tasks, optionally filtered by status or project.

use anyhow::Result;
use clap::Args;

use crate::client::DaemonClient;
use crate::output::{format_time_ago, OutputFormat};
use crate::table::{should_show_project, Column, Table};

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status (backlog, queued, processing, blocked, done, failed, archived)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by project
    #[arg(long)]
    pub project: Option<String>,
    /// Include archived tasks
    #[arg(long)]
    pub all: bool,
}

pub async fn handle(args: ListArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let tasks = client.list(args.status.as_deref(), args.project.as_deref(), args.all).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("No tasks found.");
                return Ok(());
            }

            let show_project = should_show_project(tasks.iter().map(|t| t.project.as_str()));
            let mut columns = vec![Column::right("ID"), Column::left("TITLE").with_max(50)];
            if show_project {
                columns.push(Column::left("PROJECT"));
            }
            columns.push(Column::status("STATUS"));
            columns.push(Column::muted("AGE"));

            let mut table = Table::new(columns);
            for task in &tasks {
                let title = if task.pinned { format!("\u{2605} {}", task.title) } else { task.title.clone() };
                let mut row = vec![task.id.to_string(), title];
                if show_project {
                    row.push(crate::table::project_cell(&task.project));
                }
                row.push(task.status.clone());
                row.push(format_time_ago(task.created_at));
                table.row(row);
            }
            table.render(&mut std::io::stdout());
        }
    }

    Ok(())
}
