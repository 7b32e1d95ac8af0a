//! Enumerations and field types for workflow tasks.
//!
//! This module defines the lifecycle states a task moves through and the typed
//! name/value payload carried on each task.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a workflow task.
///
/// Ultimate parents move through Pending, Searching Errors, InReview and
/// Completed; children move through Pending, InReview and Resolved. The
/// upstream API spells the parent review state `inReview`, so both spellings
/// are accepted.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum TaskState {
    #[serde(alias = "pending")]
    Pending,
    #[serde(rename = "Searching Errors", alias = "SearchingErrors")]
    SearchingErrors,
    #[serde(alias = "inReview")]
    InReview,
    #[serde(alias = "resolved")]
    Resolved,
    #[serde(alias = "completed")]
    Completed,
}

impl TaskState {
    /// Name used for display and free-text search.
    pub fn name(self) -> &'static str {
        match self {
            TaskState::Pending => "Pending",
            TaskState::SearchingErrors => "Searching Errors",
            TaskState::InReview => "InReview",
            TaskState::Resolved => "Resolved",
            TaskState::Completed => "Completed",
        }
    }

    /// States no further transition leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Resolved | TaskState::Completed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value side of a task field: string, number or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    #[default]
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Null => Ok(()),
        }
    }
}

/// A single named payload entry on a task (portfolio code, ticker, error text...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskField {
    pub name: String,
    #[serde(default)]
    pub value: FieldValue,
}
