// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn matches_name_and_aliases() {
    let mut p = Project::new("myproj", PathBuf::from("/repos/myproj"));
    p.aliases.push("mp".into());
    assert!(p.matches("myproj"));
    assert!(p.matches("mp"));
    assert!(!p.matches("other"));
}

#[test]
fn new_project_has_empty_context() {
    let p = Project::new("myproj", PathBuf::from("/repos/myproj"));
    assert!(p.context.is_empty());
}
