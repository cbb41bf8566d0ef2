// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn attachment_id_displays_as_bare_integer() {
    assert_eq!(AttachmentId(42).to_string(), "42");
}
