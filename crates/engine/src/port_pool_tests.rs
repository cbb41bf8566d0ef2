// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ty_core::TaskConfig;
use ty_storage::{Store, TaskPatch};

fn store() -> Store {
    let dir = tempfile::tempdir().unwrap();
    Store::open(dir.path().to_path_buf()).unwrap()
}

#[test]
fn allocates_lowest_free_port() {
    let store = store();
    let port = allocate_port(&store, (3100, 3110)).unwrap();
    assert_eq!(port, 3100);
}

#[test]
fn skips_ports_already_assigned() {
    let store = store();
    let task = store.create_task(TaskConfig::default()).unwrap();
    store
        .update_task(task.id, TaskPatch { port: Some(Some(3100)), ..Default::default() })
        .unwrap();

    let port = allocate_port(&store, (3100, 3110)).unwrap();
    assert_eq!(port, 3101);
}

#[test]
fn errors_when_range_is_exhausted() {
    let store = store();
    let task = store.create_task(TaskConfig::default()).unwrap();
    store
        .update_task(task.id, TaskPatch { port: Some(Some(3100)), ..Default::default() })
        .unwrap();

    assert!(allocate_port(&store, (3100, 3100)).is_err());
}
