//! Task ingestion and utility functions.
//!
//! This module provides the `TaskList` struct holding the flat task records
//! loaded from a JSON source, along with helpers for date input parsing and
//! text truncation used by the grouping, context and command layers.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::{Days, Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fields::TaskState;
use crate::task::Task;

/// Link attached to a list response by the workflow API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseLink {
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub method: String,
}

/// Envelope returned by the workflow API's task list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub values: Vec<Task>,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub links: Vec<ResponseLink>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub previous_page: Option<String>,
}

/// Flat, validated collection of task records.
///
/// Ids are unique and every root is represented by an absent ultimate parent
/// reference.
#[derive(Debug, Default, Clone)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// Load tasks from a JSON file holding either a bare array or a list response.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = fs::read_to_string(path)?;
        let list = Self::parse(&buf)?;
        info!(path = %path.display(), tasks = list.tasks.len(), "loaded tasks");
        Ok(list)
    }

    /// Parse tasks from JSON text. Unparseable timestamps or unknown states fail here.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let tasks: Vec<Task> = match value {
            Value::Array(_) => serde_json::from_value(value)?,
            other => {
                let response: TaskListResponse = serde_json::from_value(other)?;
                response.values
            }
        };
        Self::from_tasks(tasks)
    }

    /// Validate and normalise a task vector.
    ///
    /// Exact duplicates are collapsed; two records sharing an id with different
    /// content are an error.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<Task> = Vec::with_capacity(tasks.len());
        for mut t in tasks {
            t.normalise();
            if let Some(&i) = seen.get(&t.id) {
                if out[i] == t {
                    warn!(id = %t.id, "collapsing duplicate task record");
                    continue;
                }
                return Err(Error::DuplicateTask(t.id));
            }
            seen.insert(t.id.clone(), out.len());
            out.push(t);
        }
        Ok(TaskList { tasks: out })
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Number of tasks in each state present in the list.
    pub fn state_counts(&self) -> BTreeMap<TaskState, usize> {
        let mut counts = BTreeMap::new();
        for t in &self.tasks {
            *counts.entry(t.state).or_default() += 1;
        }
        counts
    }

    /// Number of tasks carrying each correlation tag.
    pub fn correlation_id_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.tasks.iter().flat_map(|t| t.correlation_ids.iter()) {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
        counts
    }
}

/// Parse a calendar day given on the command line.
///
/// Supports "today", "yesterday", "N days ago" shorthand ("3d") and
/// `YYYY-MM-DD`.
pub fn parse_day_input(s: &str) -> Result<NaiveDate> {
    let lowered = s.trim().to_lowercase();
    let today = Local::now().date_naive();
    let days_ago = |n: u64| {
        today
            .checked_sub_days(Days::new(n))
            .ok_or_else(|| Error::InvalidDate(s.to_string()))
    };
    match lowered.as_str() {
        "today" => return Ok(today),
        "yesterday" => return days_ago(1),
        _ => {}
    }
    if let Some(n) = lowered.strip_suffix('d') {
        // Unsigned parse, so "-5d" is rejected instead of landing in the future.
        return match n.trim().parse::<u64>() {
            Ok(days) => days_ago(days),
            Err(_) => Err(Error::InvalidDate(s.to_string())),
        };
    }
    NaiveDate::parse_from_str(&lowered, "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
