// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty board` - show the task board grouped by status.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

pub async fn handle(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let columns = client.board().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&columns)?);
        }
        OutputFormat::Text => {
            let mut any = false;
            for column in &columns {
                if column.tasks.is_empty() {
                    continue;
                }
                any = true;
                println!("{}", crate::color::header(&format!("{} ({})", column.status, column.tasks.len())));

                let mut table = Table::new(vec![
                    Column::right("ID"),
                    Column::left("TITLE").with_max(50),
                    Column::left("PROJECT"),
                    Column::left("EXECUTOR"),
                ]);
                for task in &column.tasks {
                    let title = if task.pinned { format!("\u{2605} {}", task.title) } else { task.title.clone() };
                    table.row(vec![task.id.to_string(), title, task.project.clone(), task.executor.clone()]);
                }
                table.render(&mut std::io::stdout());
                println!();
            }
            if !any {
                println!("No tasks.");
            }
        }
    }

    Ok(())
}
