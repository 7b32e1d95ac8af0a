//! Grouping of flat task records into ultimate-parent groups.
//!
//! Grouping follows only the ultimate parent reference: every descendant of a
//! root lands flat in that root's group, regardless of how deep it sits.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::task::Task;

/// An ultimate parent together with its flattened descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGroup {
    pub ultimate_parent: Task,
    pub children: Vec<Task>,
    pub total_count: usize,
}

impl TaskGroup {
    pub fn new(ultimate_parent: Task) -> Self {
        TaskGroup {
            ultimate_parent,
            children: Vec::new(),
            total_count: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.ultimate_parent.id
    }

    /// Parent first, then children in order.
    pub fn members(&self) -> impl Iterator<Item = &Task> {
        std::iter::once(&self.ultimate_parent).chain(self.children.iter())
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members().map(|t| t.id.as_str())
    }
}

/// Result of grouping. Every input task is either a group member or listed in
/// `dropped`: children whose ultimate parent was not in the input, and roots
/// whose id was already taken by an earlier root.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub groups: Vec<TaskGroup>,
    pub dropped: Vec<String>,
}

/// Group tasks by ultimate parent, newest parent first.
pub fn group_by_ultimate_parent(tasks: &[Task]) -> Vec<TaskGroup> {
    group_tasks(tasks).groups
}

/// Group tasks by ultimate parent and report orphaned children.
///
/// Roots become groups in input order; children are appended to their root's
/// group in input order; groups are then stable-sorted by the root's creation
/// time, newest first. A child whose root is missing is left out and its id
/// recorded in `dropped`. When two roots share an id the first one keeps the
/// group and the later one is recorded in `dropped`.
pub fn group_tasks(tasks: &[Task]) -> Grouping {
    let mut groups: Vec<TaskGroup> = Vec::new();
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    let mut dropped = Vec::new();

    for t in tasks.iter().filter(|t| t.is_ultimate_parent()) {
        if by_id.contains_key(t.id.as_str()) {
            warn!(task = %t.id, "duplicate ultimate parent id, keeping the first record");
            dropped.push(t.id.clone());
            continue;
        }
        by_id.insert(t.id.as_str(), groups.len());
        groups.push(TaskGroup::new(t.clone()));
    }

    for t in tasks {
        let Some(root) = t.ultimate_parent_id() else {
            continue;
        };
        match by_id.get(root) {
            Some(&i) => groups[i].children.push(t.clone()),
            None => {
                debug!(task = %t.id, ultimate_parent = %root, "dropping task without its ultimate parent");
                dropped.push(t.id.clone());
            }
        }
    }

    for g in groups.iter_mut() {
        g.total_count = 1 + g.children.len();
    }

    // sort_by is stable, so equal timestamps keep input order.
    groups.sort_by(|a, b| b.ultimate_parent.created_at().cmp(&a.ultimate_parent.created_at()));

    Grouping { groups, dropped }
}
