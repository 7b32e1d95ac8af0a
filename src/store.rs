//! Filter and selection state for the task panel.
//!
//! `TriageStore` owns the current task groups, the active filter criteria,
//! the selection set and the panel visibility flag. All writes go through
//! [`TriageStore::apply`]; the named methods are thin wrappers that build the
//! matching [`Action`].

use std::collections::{BTreeMap, HashSet};

use chrono::{Local, TimeZone};
use tracing::{debug, info};

use crate::filter::{filter_groups_in, FilterCriteria, FilterPatch};
use crate::group::{group_tasks, TaskGroup};
use crate::task::Task;

/// Every state transition the store supports.
#[derive(Debug, Clone)]
pub enum Action {
    SelectTask(Task),
    DeselectTask(String),
    SelectGroup(TaskGroup),
    DeselectGroup(String),
    ClearSelection,
    SetFilter(FilterPatch),
    SetGroups(Vec<TaskGroup>),
    LoadTasks(Vec<Task>),
    SetPanelVisible(bool),
}

/// How much of a group is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSelection {
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone)]
pub struct TriageStore {
    groups: Vec<TaskGroup>,
    criteria: FilterCriteria,
    selected: BTreeMap<String, Task>,
    panel_visible: bool,
}

impl Default for TriageStore {
    fn default() -> Self {
        TriageStore {
            groups: Vec::new(),
            criteria: FilterCriteria::default(),
            selected: BTreeMap::new(),
            panel_visible: true,
        }
    }
}

impl TriageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transition. This is the only place state changes.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SelectTask(task) => {
                self.selected.insert(task.id.clone(), task);
            }
            Action::DeselectTask(id) => {
                self.selected.remove(&id);
            }
            Action::SelectGroup(group) => {
                for id in group.member_ids() {
                    self.selected.remove(id);
                }
                for task in std::iter::once(group.ultimate_parent).chain(group.children) {
                    self.selected.insert(task.id.clone(), task);
                }
            }
            Action::DeselectGroup(id) => {
                let Some(group) = self.groups.iter().find(|g| g.id() == id) else {
                    debug!(group = %id, "deselecting unknown group, ignoring");
                    return;
                };
                for member in group.member_ids() {
                    self.selected.remove(member);
                }
            }
            Action::ClearSelection => self.selected.clear(),
            Action::SetFilter(patch) => {
                self.criteria.apply(patch);
                debug!(criteria = ?self.criteria, "filter updated");
            }
            Action::SetGroups(groups) => self.groups = groups,
            Action::LoadTasks(tasks) => {
                let grouping = group_tasks(&tasks);
                info!(
                    groups = grouping.groups.len(),
                    dropped = grouping.dropped.len(),
                    "task groups rebuilt"
                );
                self.groups = grouping.groups;
            }
            Action::SetPanelVisible(visible) => self.panel_visible = visible,
        }
    }

    pub fn select_task(&mut self, task: Task) {
        self.apply(Action::SelectTask(task));
    }

    pub fn deselect_task(&mut self, id: &str) {
        self.apply(Action::DeselectTask(id.to_string()));
    }

    pub fn select_group(&mut self, group: TaskGroup) {
        self.apply(Action::SelectGroup(group));
    }

    /// No-op when no current group has this ultimate parent id.
    pub fn deselect_group(&mut self, ultimate_parent_id: &str) {
        self.apply(Action::DeselectGroup(ultimate_parent_id.to_string()));
    }

    pub fn clear_selection(&mut self) {
        self.apply(Action::ClearSelection);
    }

    pub fn set_filter(&mut self, patch: FilterPatch) {
        self.apply(Action::SetFilter(patch));
    }

    pub fn set_groups(&mut self, groups: Vec<TaskGroup>) {
        self.apply(Action::SetGroups(groups));
    }

    pub fn load_tasks(&mut self, tasks: Vec<Task>) {
        self.apply(Action::LoadTasks(tasks));
    }

    pub fn set_panel_visible(&mut self, visible: bool) {
        self.apply(Action::SetPanelVisible(visible));
    }

    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    pub fn group(&self, ultimate_parent_id: &str) -> Option<&TaskGroup> {
        self.groups.iter().find(|g| g.id() == ultimate_parent_id)
    }

    /// Find a task anywhere in the current groups.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.groups.iter().flat_map(|g| g.members()).find(|t| t.id == id)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// Groups passing the current criteria, dates bucketed in local time.
    pub fn visible_groups(&self) -> Vec<&TaskGroup> {
        self.visible_groups_in(&Local)
    }

    pub fn visible_groups_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<&TaskGroup> {
        filter_groups_in(&self.groups, &self.criteria, tz)
    }

    /// Number of visible groups and the tasks they hold.
    pub fn visible_totals(&self) -> (usize, usize) {
        let visible = self.visible_groups();
        let tasks = visible.iter().map(|g| g.total_count).sum();
        (visible.len(), tasks)
    }

    /// Selected tasks ordered by id.
    pub fn selected_tasks(&self) -> Vec<&Task> {
        self.selected.values().collect()
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains_key(id)
    }

    pub fn group_selection(&self, group: &TaskGroup) -> GroupSelection {
        let hits = group.member_ids().filter(|id| self.is_selected(id)).count();
        if hits == 0 {
            GroupSelection::None
        } else if hits == group.total_count {
            GroupSelection::Full
        } else {
            GroupSelection::Partial
        }
    }

    /// Parent and every child selected.
    pub fn is_group_selected(&self, group: &TaskGroup) -> bool {
        self.group_selection(group) == GroupSelection::Full
    }

    /// Selected tasks bucketed by the id of the group they belong to.
    ///
    /// Buckets follow the current group order, members in group order. Selected
    /// tasks that no current group holds come last, bucketed by their own
    /// ultimate parent id in id order.
    pub fn selection_by_group(&self) -> Vec<(&str, Vec<&Task>)> {
        let mut out: Vec<(&str, Vec<&Task>)> = Vec::new();
        let mut placed: HashSet<&str> = HashSet::new();
        for group in &self.groups {
            let members: Vec<&Task> = group
                .members()
                .filter_map(|t| self.selected.get(&t.id))
                .collect();
            if members.is_empty() {
                continue;
            }
            placed.extend(members.iter().map(|t| t.id.as_str()));
            out.push((group.id(), members));
        }
        for task in self.selected.values() {
            if placed.contains(task.id.as_str()) {
                continue;
            }
            match out.iter().position(|(id, _)| *id == task.group_id()) {
                Some(i) => out[i].1.push(task),
                None => out.push((task.group_id(), vec![task])),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TaskState;
    use crate::fixtures::{sample_tasks, SAMPLE_COMPLETED_PARENT_ID, SAMPLE_PARENT_ID};
    use chrono::{NaiveDate, Utc};

    fn loaded() -> TriageStore {
        let mut store = TriageStore::new();
        store.load_tasks(sample_tasks().unwrap());
        store
    }

    fn selected_ids(store: &TriageStore) -> Vec<String> {
        store.selected_tasks().iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_load_tasks_builds_groups() {
        let store = loaded();
        assert_eq!(store.groups().len(), 2);
        assert_eq!(store.groups()[0].id(), SAMPLE_PARENT_ID);
        assert!(store.panel_visible());
        assert!(store.task("1234c6c2-a96a-4c4b-a283-549cb7b56998").is_some());
    }

    #[test]
    fn test_select_task_replaces_same_id() {
        let mut store = loaded();
        let task = store.groups()[1].ultimate_parent.clone();
        store.select_task(task.clone());
        let mut edited = task.clone();
        edited.state = TaskState::Pending;
        store.select_task(edited);
        assert_eq!(store.selection_len(), 1);
        assert_eq!(store.selected_tasks()[0].state, TaskState::Pending);

        store.deselect_task(&task.id);
        store.deselect_task("not-there");
        assert_eq!(store.selection_len(), 0);
    }

    #[test]
    fn test_select_group_is_idempotent() {
        let mut store = loaded();
        let group = store.groups()[0].clone();
        store.select_group(group.clone());
        let once = selected_ids(&store);
        store.select_group(group.clone());
        assert_eq!(selected_ids(&store), once);
        assert_eq!(once.len(), 4);
        assert!(store.is_group_selected(&group));
    }

    #[test]
    fn test_deselect_group_restores_prior_selection() {
        let mut store = loaded();
        let other = store.groups()[1].ultimate_parent.clone();
        store.select_task(other);
        let before = selected_ids(&store);

        let group = store.groups()[0].clone();
        store.select_group(group.clone());
        store.deselect_group(group.id());
        assert_eq!(selected_ids(&store), before);
    }

    #[test]
    fn test_deselect_unknown_group_is_noop() {
        let mut store = loaded();
        let group = store.groups()[0].clone();
        store.select_group(group);
        let before = selected_ids(&store);
        store.deselect_group("unknown");
        assert_eq!(selected_ids(&store), before);
    }

    #[test]
    fn test_deselect_group_uses_current_group_list() {
        let mut store = loaded();
        let group = store.groups()[0].clone();
        store.select_group(group.clone());
        store.set_groups(Vec::new());
        store.deselect_group(group.id());
        assert_eq!(store.selection_len(), 4);
    }

    #[test]
    fn test_group_selection_states() {
        let mut store = loaded();
        let group = store.groups()[0].clone();
        assert_eq!(store.group_selection(&group), GroupSelection::None);

        store.select_task(group.children[0].clone());
        assert_eq!(store.group_selection(&group), GroupSelection::Partial);

        store.select_group(group.clone());
        assert_eq!(store.group_selection(&group), GroupSelection::Full);

        store.deselect_task(group.id());
        assert_eq!(store.group_selection(&group), GroupSelection::Partial);
        assert!(!store.is_group_selected(&group));

        // Partial selection does not block a fresh group add.
        store.select_group(group.clone());
        assert!(store.is_group_selected(&group));

        store.clear_selection();
        assert_eq!(store.selection_len(), 0);
    }

    #[test]
    fn test_lone_parent_group_selection() {
        let mut store = loaded();
        let group = store.group(SAMPLE_COMPLETED_PARENT_ID).unwrap().clone();
        store.select_task(group.ultimate_parent.clone());
        assert!(store.is_group_selected(&group));
    }

    #[test]
    fn test_set_filter_merges() {
        let mut store = loaded();
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        store.set_filter(FilterPatch::default().date_from(Some(day)));
        store.set_filter(FilterPatch::default().search_query(Some("foo")));
        assert_eq!(store.criteria().date_from, Some(day));
        assert_eq!(store.criteria().search_query.as_deref(), Some("foo"));
    }

    #[test]
    fn test_visible_groups_follow_criteria() {
        let mut store = loaded();
        assert_eq!(store.visible_groups_in(&Utc).len(), 2);
        store.set_filter(FilterPatch::default().correlation_ids(["Late Morning DQ"]));
        let visible: Vec<&str> = store.visible_groups_in(&Utc).into_iter().map(|g| g.id()).collect();
        assert_eq!(visible, vec![SAMPLE_COMPLETED_PARENT_ID]);
        assert_eq!(store.visible_totals(), (1, 1));

        store.apply(Action::LoadTasks(Vec::new()));
        assert!(store.visible_groups_in(&Utc).is_empty());
        assert_eq!(store.criteria().correlation_ids.as_ref().map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_selection_by_group() {
        let mut store = loaded();
        let big = store.groups()[0].clone();
        let lone = store.groups()[1].clone();
        store.select_task(big.children[1].clone());
        store.select_task(big.children[2].clone());
        store.select_task(lone.ultimate_parent.clone());
        let buckets = store.selection_by_group();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].0, SAMPLE_PARENT_ID);
        let ids: Vec<&str> = buckets[0].1.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![big.children[1].id.as_str(), big.children[2].id.as_str()]);
        assert_eq!(buckets[1].0, SAMPLE_COMPLETED_PARENT_ID);
        assert_eq!(buckets[1].1.len(), 1);
    }

    #[test]
    fn test_selection_outside_current_groups_is_kept() {
        let mut store = loaded();
        let stray = store.groups()[0].children[0].clone();
        store.select_task(stray.clone());
        store.set_groups(Vec::new());
        let buckets = store.selection_by_group();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].0, SAMPLE_PARENT_ID);
        assert_eq!(buckets[0].1[0].id, stray.id);
    }

    #[test]
    fn test_panel_visibility() {
        let mut store = TriageStore::new();
        store.set_panel_visible(false);
        assert!(!store.panel_visible());
    }
}
