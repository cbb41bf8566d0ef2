// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty update` - update a task's mutable fields.

use anyhow::Result;
use clap::Args;

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct UpdateArgs {
    /// Task id
    pub id: u64,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New body
    #[arg(long)]
    pub body: Option<String>,
    /// New executor
    #[arg(long)]
    pub executor: Option<String>,
    /// Enable or disable dangerous mode
    #[arg(long)]
    pub dangerous_mode: Option<bool>,
}

pub async fn handle(args: UpdateArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let task = client
        .update(
            args.id,
            args.title.as_deref(),
            args.body.as_deref(),
            args.executor.as_deref(),
            args.dangerous_mode,
        )
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&task)?),
        OutputFormat::Text => println!("Updated task #{}", task.summary.id),
    }

    Ok(())
}
