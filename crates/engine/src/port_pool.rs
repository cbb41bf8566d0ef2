// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocation for worktree dev servers. Ports are not reserved out of
//! band: the Store's task rows are the source of truth for what's in use,
//! so the pool is just "lowest free port in range, scanning every non-closed
//! task's `port` field."

use ty_storage::{Store, TaskFilter};

use crate::error::EngineError;

/// Allocate the lowest free port in `range` (inclusive), skipping ports held
/// by any task that still has an active worktree.
pub fn allocate_port(store: &Store, range: (u16, u16)) -> Result<u16, EngineError> {
    let in_use: std::collections::HashSet<u16> = store
        .list_tasks(&TaskFilter {
            include_closed: true,
            ..Default::default()
        })
        .into_iter()
        .filter_map(|t| t.port)
        .collect();

    (range.0..=range.1)
        .find(|p| !in_use.contains(p))
        .ok_or_else(|| EngineError::Worktree(format!("no free port in {}..={}", range.0, range.1)))
}

#[cfg(test)]
#[path = "port_pool_tests.rs"]
mod tests;
