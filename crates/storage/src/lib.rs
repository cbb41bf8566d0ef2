// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Event-sourced storage: a JSONL write-ahead log of `ty_core::Event`s, an
//! in-memory `MaterializedState` rebuilt by replay, periodic compressed
//! snapshots, and the `Store` facade the rest of the engine talks to.

mod checkpoint;
mod migration;
mod snapshot;
mod state;
mod store;
mod wal;

pub use checkpoint::{
    load_snapshot, CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter,
    Checkpointer, FsCheckpointWriter,
};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use store::{Store, StoreError, TaskFilter, TaskPatch};
pub use wal::{Wal, WalEntry, WalError};
