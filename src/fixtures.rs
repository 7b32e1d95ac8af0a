//! Built-in sample data: one aggregation-error parent with three children and
//! one completed parent with none.

use crate::db::TaskList;
use crate::error::Result;
use crate::task::Task;

pub const SAMPLE_TASKS_JSON: &str = include_str!("../data/sample_tasks.json");

pub const SAMPLE_PARENT_ID: &str = "2b888027-60e4-405e-82c6-bc0be9493e2e";
pub const SAMPLE_COMPLETED_PARENT_ID: &str = "ac6f4add-24d9-430b-9e3a-c02e0b370a00";

/// The sample task records, validated like any other source.
pub fn sample_tasks() -> Result<Vec<Task>> {
    Ok(TaskList::parse(SAMPLE_TASKS_JSON)?.tasks)
}
