// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: agent CLI execution, terminal multiplexing,
//! and hook-record file tailing.

mod env;
pub mod executor;
pub mod multiplexer;
pub mod subprocess;
pub mod tail;
pub mod traced;

pub use executor::{
    supports_resume, ClaudeExecutorAdapter, CodexExecutorAdapter, ExecutorAdapter, ExecutorError,
    ExecutorHandle, GeminiExecutorAdapter, LaunchSpec,
};
pub use multiplexer::{MultiplexerAdapter, MultiplexerError, NoOpMultiplexerAdapter, TmuxMultiplexerAdapter};
pub use tail::{watch_file, FileTailer};
pub use traced::{TracedExecutor, TracedMultiplexer};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use executor::{ExecutorCall, FakeExecutorAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use multiplexer::{FakeMultiplexerAdapter, FakeWindow, MultiplexerCall};
