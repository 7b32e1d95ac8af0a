//! Workflow task record and related functionality.
//!
//! This module defines the `Task` struct that represents one unit of work in a
//! data-quality workflow, with its definition, lifecycle state, hierarchy
//! references, provenance and field payload. The serde layout follows the
//! workflow API's camelCase JSON.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Scope and code identifying the definition a task was created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinitionId {
    pub scope: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionVersion {
    pub as_at_modified: DateTime<FixedOffset>,
}

/// Creation and modification provenance of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskVersion {
    pub as_at_created: DateTime<FixedOffset>,
    pub user_id_created: String,
    pub request_id_created: String,
    pub as_at_modified: DateTime<FixedOffset>,
    pub user_id_modified: String,
    pub request_id_modified: String,
    pub as_at_version_number: u32,
}

/// Lightweight pointer to another task (parent, ultimate parent or child).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReference {
    pub id: String,
    pub task_definition_id: TaskDefinitionId,
    pub task_definition_version: TaskDefinitionVersion,
    pub task_definition_display_name: String,
    pub state: TaskState,
}

/// A workflow task with its hierarchy, provenance and payload.
///
/// A task without an ultimate parent reference is itself the root of its
/// hierarchy. Grouping only follows `ultimate_parent_task`; `child_tasks` is
/// carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub task_definition_id: TaskDefinitionId,
    pub task_definition_version: TaskDefinitionVersion,
    pub task_definition_display_name: String,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultimate_parent_task: Option<TaskReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task: Option<TaskReference>,
    #[serde(default)]
    pub child_tasks: Vec<TaskReference>,
    #[serde(default)]
    pub correlation_ids: Vec<String>,
    pub version: TaskVersion,
    pub terminal_state: bool,
    pub as_at_last_transition: DateTime<FixedOffset>,
    #[serde(default)]
    pub fields: Vec<TaskField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacking_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_log_id_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_log_id_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_log_id_submitted: Option<String>,
}

impl Task {
    /// Create a root task with empty payload, created and last modified at `created`.
    pub fn new(
        id: &str,
        definition: TaskDefinitionId,
        display_name: &str,
        state: TaskState,
        created: DateTime<FixedOffset>,
    ) -> Self {
        Task {
            id: id.to_string(),
            task_definition_id: definition,
            task_definition_version: TaskDefinitionVersion { as_at_modified: created },
            task_definition_display_name: display_name.to_string(),
            state,
            ultimate_parent_task: None,
            parent_task: None,
            child_tasks: Vec::new(),
            correlation_ids: Vec::new(),
            version: TaskVersion {
                as_at_created: created,
                user_id_created: String::new(),
                request_id_created: String::new(),
                as_at_modified: created,
                user_id_modified: String::new(),
                request_id_modified: String::new(),
                as_at_version_number: 1,
            },
            terminal_state: state.is_terminal(),
            as_at_last_transition: created,
            fields: Vec::new(),
            stacking_key: None,
            action_log_id_created: None,
            action_log_id_modified: None,
            action_log_id_submitted: None,
        }
    }

    /// Attach this task directly under `parent`, inheriting its ultimate parent.
    pub fn under(mut self, parent: &Task) -> Self {
        let root = parent
            .ultimate_parent_task
            .clone()
            .unwrap_or_else(|| parent.reference());
        self.ultimate_parent_task = Some(root);
        self.parent_task = Some(parent.reference());
        self
    }

    /// Build a reference pointing at this task.
    pub fn reference(&self) -> TaskReference {
        TaskReference {
            id: self.id.clone(),
            task_definition_id: self.task_definition_id.clone(),
            task_definition_version: self.task_definition_version.clone(),
            task_definition_display_name: self.task_definition_display_name.clone(),
            state: self.state,
        }
    }

    /// Drop an ultimate parent reference that points back at this task.
    ///
    /// After normalisation `ultimate_parent_task == None` is the only way a
    /// root is represented.
    pub fn normalise(&mut self) {
        if self
            .ultimate_parent_task
            .as_ref()
            .is_some_and(|r| r.id == self.id)
        {
            self.ultimate_parent_task = None;
        }
    }

    /// True when this task is the root of its hierarchy.
    pub fn is_ultimate_parent(&self) -> bool {
        match &self.ultimate_parent_task {
            None => true,
            Some(r) => r.id == self.id,
        }
    }

    /// Id of the root this task hangs under, or `None` if it is a root.
    pub fn ultimate_parent_id(&self) -> Option<&str> {
        match &self.ultimate_parent_task {
            Some(r) if r.id != self.id => Some(r.id.as_str()),
            _ => None,
        }
    }

    /// Id of the group this task belongs to: its ultimate parent's, or its own.
    pub fn group_id(&self) -> &str {
        self.ultimate_parent_id().unwrap_or(&self.id)
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.version.as_at_created
    }

    /// Calendar day of creation as seen in `tz`.
    pub fn created_day_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.version.as_at_created.with_timezone(tz).date_naive()
    }

    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// First field with the given name, when it carries text.
    pub fn field_text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }
}
