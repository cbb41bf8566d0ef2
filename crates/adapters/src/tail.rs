// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental line tailer for append-only JSONL files, backed by a
//! filesystem watch with polling fallback.
//!
//! The Hook Ingestor uses this to follow each task's hook-record file
//! (pre/post-tool-use, notification, stop events appended by the agent's
//! hook scripts) without re-reading the whole file on every change.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Tracks a byte offset into a growing file and yields whole lines appended
/// since the last read. Lines are JSONL; malformed ones are skipped rather
/// than stalling the tail.
pub struct FileTailer {
    path: PathBuf,
    offset: u64,
}

impl FileTailer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), offset: 0 }
    }

    /// Resume from a previously recorded byte offset (e.g. after a daemon restart).
    pub fn with_offset(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self { path: path.into(), offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read any whole lines appended since the last call. A line without a
    /// trailing newline is left unread until it's completed.
    pub fn read_new_lines(&mut self) -> std::io::Result<Vec<String>> {
        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        if file_len < self.offset {
            // File was truncated or replaced (e.g. log rotation); restart from 0.
            self.offset = 0;
        }
        if file_len == self.offset {
            return Ok(Vec::new());
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(self.offset))?;

        let mut lines = Vec::new();
        let mut consumed = self.offset;
        let mut buf = String::new();
        loop {
            buf.clear();
            match reader.read_line(&mut buf)? {
                0 => break,
                n => {
                    if !buf.ends_with('\n') {
                        // Partial line at EOF; wait for the writer to finish it.
                        break;
                    }
                    consumed += n as u64;
                    let trimmed = buf.trim();
                    if !trimmed.is_empty() {
                        lines.push(trimmed.to_string());
                    }
                }
            }
        }
        self.offset = consumed;
        Ok(lines)
    }
}

/// Start watching `path` for appends, sending a wakeup on the returned
/// channel each time the file changes. The caller drains new lines with a
/// [`FileTailer`] on each wakeup (and on a fallback poll interval, since
/// `notify` can miss events on some filesystems/editors).
pub fn watch_file(path: &Path) -> Result<(RecommendedWatcher, mpsc::Receiver<()>), notify::Error> {
    let (tx, rx) = mpsc::channel(32);
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if res.is_ok() {
            let _ = tx.blocking_send(());
        }
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
