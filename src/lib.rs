//! # task_triage
//!
//! Grouping, filtering and selection core for a workflow task panel that sits
//! next to an AI agent chat.
//!
//! Workflow tasks arrive as a flat list. Each may point at an ultimate parent
//! (the root of its hierarchy). The crate:
//!
//! - groups tasks under their ultimate parent, newest group first ([`group`])
//! - filters groups by creation day, free text, batch and state ([`filter`])
//! - keeps a selection set with whole-group select and deselect ([`store`])
//! - renders the selection as a compact context block for the agent ([`context`])
//!
//! ```no_run
//! use std::path::Path;
//!
//! use task_triage::db::TaskList;
//! use task_triage::filter::FilterPatch;
//! use task_triage::store::TriageStore;
//!
//! let list = TaskList::load(Path::new("tasks.json"))?;
//! let mut store = TriageStore::new();
//! store.load_tasks(list.tasks);
//! store.set_filter(FilterPatch::default().correlation_ids(["Early Morning DQ"]));
//! let newest = store.visible_groups().first().map(|g| (*g).clone());
//! if let Some(group) = newest {
//!     store.select_group(group);
//! }
//! println!("{}", task_triage::context::render_selection(&store));
//! # Ok::<(), task_triage::error::Error>(())
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod fields;
pub mod filter;
pub mod fixtures;
pub mod group;
pub mod store;
pub mod task;

pub use error::{Error, Result};
