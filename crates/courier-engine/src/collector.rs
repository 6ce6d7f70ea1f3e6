// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merge target lists into one ordered, duplicate-free recipient set.

use std::collections::HashSet;

use courier_core::types::{RecipientKind, RecipientRef, TargetGroup};

/// Collect recipients from `groups` in order.
///
/// Groups are visited in the order given; within a group the categories go
/// accounts, contacts, leads, users. The first occurrence of a
/// (category, id) pair wins and later duplicates are dropped.
pub fn collect_targets(groups: &[TargetGroup]) -> Vec<RecipientRef> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for group in groups {
        for kind in RecipientKind::COLLECTION_ORDER {
            for id in group.members(kind) {
                let target = RecipientRef {
                    kind,
                    id: id.clone(),
                };
                if seen.insert(target.clone()) {
                    targets.push(target);
                }
            }
        }
    }
    targets
}
