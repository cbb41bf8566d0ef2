// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty logs` - show or follow a task's executor log.

use anyhow::Result;

use crate::client::DaemonClient;
use crate::output::{display_log, OutputFormat};

pub async fn handle(
    client: &DaemonClient, id: u64, follow: bool, limit: Option<usize>, format: OutputFormat,
) -> Result<()> {
    let lines = client.logs(id, limit).await?;
    display_log(client, id, lines, follow, format).await
}
