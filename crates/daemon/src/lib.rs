// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task You Daemon library
//!
//! Exposes the IPC protocol types for use by `ty`, the CLI client.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod protocol_wire;

pub mod protocol;

pub use protocol::{
    BoardColumn, EventEntry, LogLine, Request, Response, TaskDetail, TaskSummary, WebhookEntry,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
