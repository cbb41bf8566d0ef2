// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tyd mcp-stdio` — the subcommand the Executor Supervisor points each
//! task's `.mcp.json` at (`ty_engine::supervisor::write_mcp_config`). The
//! agent CLI spawns this as its own child process, so its stdin/stdout
//! become the MCP transport without the daemon ever touching the agent's
//! process group directly.

use std::path::PathBuf;
use std::sync::Arc;

use ty_core::TaskId;
use ty_engine::McpServer;
use ty_storage::Store;

pub struct McpStdioArgs {
    pub data_dir: PathBuf,
    pub task_id: u64,
    pub project: String,
    pub worktree: PathBuf,
    pub main_repo: PathBuf,
}

pub async fn run(args: McpStdioArgs) -> anyhow::Result<()> {
    let store = Arc::new(Store::open(&args.data_dir)?);
    let server = McpServer::new(store, TaskId(args.task_id), args.project, args.worktree, args.main_repo);
    ty_engine::run_stdio(server, tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}
