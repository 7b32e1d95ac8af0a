//! Compact, line-oriented rendering of selected tasks for an agent prompt.
//!
//! ```text
//! task_context:v1
//! parent|<id>|<name>|state:<state>|created:<iso>|children:<n>|corr:<a,b>
//! task|<id>|<name>|state:<state>|created:<iso>|terminal:<bool>|stack:<key>|corr:<a,b>
//! fields: <k>=<v> | <k>=<v>
//! meta: <k>=<v> | <k>=<v>
//! ```
//!
//! One `parent` line per group of selected tasks, followed by a `task` block
//! for every selected member of that group (the parent included, when it is
//! selected).

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::db::truncate;
use crate::store::TriageStore;
use crate::task::Task;

pub const CONTEXT_HEADER: &str = "task_context:v1";

const VALUE_WIDTH: usize = 256;
const NAME_WIDTH: usize = 160;
const SHORT_WIDTH: usize = 64;

/// Render every selected task in the store.
pub fn render_selection(store: &TriageStore) -> String {
    let buckets = store.selection_by_group();
    let mut lines = vec![CONTEXT_HEADER.to_string()];
    if buckets.is_empty() {
        lines.push("(empty)".to_string());
        return lines.join("\n");
    }

    for (group_id, tasks) in buckets {
        // Prefer the stored group's parent record; fall back to the selected
        // task with that id, then to the first selected member.
        let parent = store
            .group(group_id)
            .map(|g| &g.ultimate_parent)
            .or_else(|| tasks.iter().copied().find(|t| t.id == group_id))
            .unwrap_or(tasks[0]);
        let children = tasks.iter().filter(|t| t.id != parent.id).count();
        lines.push(parent_line(parent, children));
        for task in tasks {
            render_task(task, &mut lines);
        }
    }
    lines.join("\n")
}

/// Render an explicit list of tasks, grouping them by ultimate parent id in
/// first-seen order.
pub fn render_tasks(tasks: &[Task]) -> String {
    let mut lines = vec![CONTEXT_HEADER.to_string()];
    if tasks.is_empty() {
        lines.push("(empty)".to_string());
        return lines.join("\n");
    }

    let mut buckets: Vec<(&str, Vec<&Task>)> = Vec::new();
    for task in tasks {
        match buckets.iter().position(|(id, _)| *id == task.group_id()) {
            Some(i) => buckets[i].1.push(task),
            None => buckets.push((task.group_id(), vec![task])),
        }
    }

    for (group_id, members) in buckets {
        let parent = members
            .iter()
            .copied()
            .find(|t| t.id == group_id)
            .unwrap_or(members[0]);
        lines.push(parent_line(parent, members.len().saturating_sub(1)));
        for task in members {
            render_task(task, &mut lines);
        }
    }
    lines.join("\n")
}

fn parent_line(parent: &Task, children: usize) -> String {
    [
        "parent".to_string(),
        parent.id.clone(),
        truncate(&parent.task_definition_display_name, NAME_WIDTH),
        format!("state:{}", truncate(parent.state.name(), SHORT_WIDTH)),
        format!("created:{}", truncate(&iso(parent.created_at()), SHORT_WIDTH)),
        format!("children:{children}"),
        format!("corr:{}", parent.correlation_ids.join(",")),
    ]
    .join("|")
}

fn render_task(task: &Task, lines: &mut Vec<String>) {
    lines.push(
        [
            "task".to_string(),
            task.id.clone(),
            truncate(&task.task_definition_display_name, NAME_WIDTH),
            format!("state:{}", truncate(task.state.name(), SHORT_WIDTH)),
            format!("created:{}", truncate(&iso(task.created_at()), SHORT_WIDTH)),
            format!("terminal:{}", task.terminal_state),
            format!(
                "stack:{}",
                truncate(task.stacking_key.as_deref().unwrap_or(""), SHORT_WIDTH)
            ),
            format!("corr:{}", task.correlation_ids.join(",")),
        ]
        .join("|"),
    );

    let fields: Vec<String> = task
        .fields
        .iter()
        .filter(|f| !f.name.is_empty())
        .map(|f| format!("{}={}", f.name, truncate(&f.value.to_string(), VALUE_WIDTH)))
        .collect();
    if !fields.is_empty() {
        lines.push(format!("fields: {}", fields.join(" | ")));
    }

    let meta: Vec<String> = meta_pairs(task)
        .into_iter()
        .map(|(k, v)| format!("{k}={}", truncate(&v, VALUE_WIDTH)))
        .collect();
    if !meta.is_empty() {
        lines.push(format!("meta: {}", meta.join(" | ")));
    }
}

fn meta_pairs(task: &Task) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("asAtLastTransition", iso(task.as_at_last_transition))];
    let optional = [
        ("actionLogIdCreated", &task.action_log_id_created),
        ("actionLogIdModified", &task.action_log_id_modified),
        ("actionLogIdSubmitted", &task.action_log_id_submitted),
    ];
    for (key, value) in optional {
        if let Some(v) = value {
            pairs.push((key, v.clone()));
        }
    }
    pairs.push(("version.asAtModified", iso(task.version.as_at_modified)));
    for (key, value) in [
        ("version.userIdCreated", &task.version.user_id_created),
        ("version.userIdModified", &task.version.user_id_modified),
    ] {
        pairs.push((key, value.clone()));
    }
    pairs.push((
        "version.asAtVersionNumber",
        task.version.as_at_version_number.to_string(),
    ));
    pairs
}

fn iso(ts: DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_tasks, SAMPLE_COMPLETED_PARENT_ID, SAMPLE_PARENT_ID};

    fn store() -> TriageStore {
        let mut store = TriageStore::new();
        store.load_tasks(sample_tasks().unwrap());
        store
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(render_selection(&store()), "task_context:v1\n(empty)");
        assert_eq!(render_tasks(&[]), "task_context:v1\n(empty)");
    }

    #[test]
    fn test_whole_group_selection() {
        let mut store = store();
        let group = store.group(SAMPLE_PARENT_ID).unwrap().clone();
        store.select_group(group);
        let out = render_selection(&store);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], CONTEXT_HEADER);
        assert!(lines[1].starts_with(&format!("parent|{SAMPLE_PARENT_ID}|Aggregation Errors Parent Task|state:InReview|")));
        assert!(lines[1].contains("|children:3|corr:Early Morning DQ"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("task|")).count(), 4);
        assert!(out.contains("Ticker=CBA"));
        assert!(out.contains("terminal:true"));
        assert!(out.contains("meta: asAtLastTransition=2025-09-01T22:44:18.506773+00:00"));
    }

    #[test]
    fn test_child_only_selection_uses_group_parent() {
        let mut store = store();
        let child = store.group(SAMPLE_PARENT_ID).unwrap().children[1].clone();
        store.select_task(child.clone());
        let lone = store.group(SAMPLE_COMPLETED_PARENT_ID).unwrap().ultimate_parent.clone();
        store.select_task(lone);
        let out = render_selection(&store);
        let parents: Vec<&str> = out.lines().filter(|l| l.starts_with("parent|")).collect();
        assert_eq!(parents.len(), 2);
        assert!(parents.iter().any(|l| l.starts_with(&format!("parent|{SAMPLE_PARENT_ID}|")) && l.contains("children:1")));
        assert!(parents.iter().any(|l| l.contains(SAMPLE_COMPLETED_PARENT_ID) && l.contains("children:0")));
    }

    #[test]
    fn test_render_tasks_groups_in_first_seen_order() {
        let tasks = sample_tasks().unwrap();
        let out = render_tasks(&tasks);
        let parents: Vec<&str> = out.lines().filter(|l| l.starts_with("parent|")).collect();
        assert_eq!(parents.len(), 2);
        assert!(parents[0].contains(SAMPLE_PARENT_ID));
        assert!(parents[0].contains("children:3"));
        assert!(parents[1].contains("children:0"));
    }

    #[test]
    fn test_meta_keeps_empty_user_ids() {
        let mut tasks = sample_tasks().unwrap();
        tasks.truncate(1);
        tasks[0].version.user_id_modified.clear();
        let out = render_tasks(&tasks);
        let meta = out.lines().find(|l| l.starts_with("meta: ")).unwrap();
        assert!(meta.contains("version.userIdCreated=00u12u680zegmCPd62p8 | "));
        assert!(meta.contains("version.userIdModified= | "));
    }

    #[test]
    fn test_selection_follows_group_order() {
        let mut store = store();
        let lone = store.group(SAMPLE_COMPLETED_PARENT_ID).unwrap().clone();
        store.select_group(lone);
        let big = store.group(SAMPLE_PARENT_ID).unwrap().clone();
        store.select_task(big.children[2].clone());
        store.select_task(big.children[0].clone());
        let out = render_selection(&store);
        let ids: Vec<&str> = out
            .lines()
            .filter(|l| l.starts_with("parent|") || l.starts_with("task|"))
            .map(|l| l.split('|').nth(1).unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![
                SAMPLE_PARENT_ID,
                big.children[0].id.as_str(),
                big.children[2].id.as_str(),
                SAMPLE_COMPLETED_PARENT_ID,
                SAMPLE_COMPLETED_PARENT_ID,
            ]
        );
    }

    #[test]
    fn test_long_values_are_truncated() {
        let mut tasks = sample_tasks().unwrap();
        tasks.truncate(1);
        tasks[0].fields.push(crate::fields::TaskField {
            name: "Error".into(),
            value: crate::fields::FieldValue::Text("x".repeat(400)),
        });
        let out = render_tasks(&tasks);
        let fields = out.lines().find(|l| l.starts_with("fields: ")).unwrap();
        let value = fields.trim_start_matches("fields: Error=");
        assert_eq!(value.chars().count(), VALUE_WIDTH);
        assert!(value.ends_with('…'));
    }
}
