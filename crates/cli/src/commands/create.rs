// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty create` - create a new task in the backlog.

use anyhow::Result;
use clap::Args;

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct CreateArgs {
    /// Task title
    pub title: String,
    /// Project this task belongs to
    #[arg(long)]
    pub project: Option<String>,
    /// Task kind (feature, fix, chore, ...)
    #[arg(long, alias = "type")]
    pub kind: Option<String>,
    /// Task body / instructions
    #[arg(long)]
    pub body: Option<String>,
    /// Executor to run this task with
    #[arg(long)]
    pub executor: Option<String>,
}

pub async fn handle(args: CreateArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let project = args.project.unwrap_or_default();
    let body = args.body.unwrap_or_default();
    let task =
        client.create(&args.title, &project, args.kind.as_deref(), &body, args.executor.as_deref()).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&task)?),
        OutputFormat::Text => println!("Created task #{}: {}", task.summary.id, task.summary.title),
    }

    Ok(())
}
