// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simple single-task mutations: execute, retry, status, pin, close, delete.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::OutputFormat;

fn report(format: OutputFormat, id: u64, action: &str) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "id": id, "action": action }))?)
        }
        OutputFormat::Text => println!("{action} task #{id}"),
    }
    Ok(())
}

pub async fn execute(client: &DaemonClient, id: u64, format: OutputFormat) -> Result<()> {
    client.execute(id).await?;
    report(format, id, "queued")
}

pub async fn retry(client: &DaemonClient, id: u64, feedback: Option<&str>, format: OutputFormat) -> Result<()> {
    client.retry(id, feedback).await?;
    report(format, id, "retried")
}

pub async fn set_status(client: &DaemonClient, id: u64, status: &str, format: OutputFormat) -> Result<()> {
    client.set_status(id, status).await?;
    report(format, id, status)
}

pub async fn pin(client: &DaemonClient, id: u64, unpin: bool, format: OutputFormat) -> Result<()> {
    client.pin(id, !unpin).await?;
    report(format, id, if unpin { "unpinned" } else { "pinned" })
}

pub async fn close(client: &DaemonClient, id: u64, format: OutputFormat) -> Result<()> {
    client.close(id).await?;
    report(format, id, "closed")
}

pub async fn delete(client: &DaemonClient, id: u64, format: OutputFormat) -> Result<()> {
    client.delete(id).await?;
    report(format, id, "deleted")
}
