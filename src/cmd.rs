//! Command implementations for the CLI interface.
//!
//! Each handler loads tasks into a `TriageStore`, drives it through the same
//! actions a UI would emit and prints the result.

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Args, Subcommand};
use clap_complete::{generate, Shell};
use tracing::{debug, info};

use crate::config::{preferences_path, Preferences};
use crate::context::render_selection;
use crate::db::{parse_day_input, truncate, TaskList};
use crate::error::{Error, Result};
use crate::fields::TaskState;
use crate::filter::{FilterPatch, SearchScope};
use crate::fixtures::sample_tasks;
use crate::group::TaskGroup;
use crate::store::{GroupSelection, TriageStore};
use crate::task::Task;

#[derive(Subcommand)]
pub enum Commands {
    /// List task groups, newest first, with optional filters.
    Groups {
        #[command(flatten)]
        filter: FilterArgs,
        /// Show each group's children under it.
        #[arg(long)]
        children: bool,
        /// Limit number of groups printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Select groups or tasks and print them as an agent context block.
    Context {
        /// Ultimate parent id of a group to select. May be repeated.
        #[arg(long = "group")]
        groups: Vec<String>,
        /// Id of a single task to select. May be repeated.
        #[arg(long = "task")]
        tasks: Vec<String>,
        /// Select every group passing the filters.
        #[arg(long)]
        all_visible: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// View a single task by id.
    View {
        /// Task id.
        id: String,
    },

    /// List distinct states with task counts.
    States,

    /// List distinct batches (correlation ids) with task counts.
    Batches,

    /// Show or set the chat endpoint preference.
    Endpoint {
        /// New endpoint URL; omit to print the current one.
        url: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Filter flags shared by the listing and context commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Earliest creation day: YYYY-MM-DD, "today", "yesterday" or "Nd".
    #[arg(long)]
    pub from: Option<String>,
    /// Latest creation day, inclusive.
    #[arg(long)]
    pub to: Option<String>,
    /// Single creation day; overrides --from and --to.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub on: Option<String>,
    /// Case-insensitive text to look for in names and states.
    #[arg(long)]
    pub search: Option<String>,
    /// Also search field names and values (ticker, portfolio code, error text).
    #[arg(long)]
    pub search_fields: bool,
    /// Accepted state. May be repeated.
    #[arg(long = "state", value_enum)]
    pub states: Vec<TaskState>,
    /// Accepted batch (correlation id). May be repeated.
    #[arg(long = "batch")]
    pub batches: Vec<String>,
}

impl FilterArgs {
    /// Translate flags into a patch; flags not given leave the criteria untouched.
    pub fn to_patch(&self) -> Result<FilterPatch> {
        let mut patch = FilterPatch::default();
        if let Some(on) = &self.on {
            patch = patch.on_day(Some(parse_day_input(on)?));
        } else {
            let from = self.from.as_deref().map(parse_day_input).transpose()?;
            let to = self.to.as_deref().map(parse_day_input).transpose()?;
            if let (Some(from), Some(to)) = (from, to) {
                if from > to {
                    return Err(Error::EmptyDateRange { from, to });
                }
            }
            if from.is_some() {
                patch = patch.date_from(from);
            }
            if to.is_some() {
                patch = patch.date_to(to);
            }
        }
        if let Some(q) = &self.search {
            patch = patch.search_query(Some(q));
        }
        if self.search_fields {
            patch = patch.search_scope(SearchScope::IncludeFields);
        }
        if !self.states.is_empty() {
            patch = patch.states(self.states.iter().copied());
        }
        if !self.batches.is_empty() {
            patch = patch.correlation_ids(self.batches.iter().cloned());
        }
        Ok(patch)
    }
}

/// Where task records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskSource {
    File(PathBuf),
    Sample,
}

impl TaskSource {
    /// Explicit file, then the built-in sample, then `<data-dir>/tasks.json`.
    pub fn resolve(tasks: Option<PathBuf>, sample: bool, data_dir: &Path) -> Self {
        match (tasks, sample) {
            (Some(path), _) => TaskSource::File(path),
            (None, true) => TaskSource::Sample,
            (None, false) => TaskSource::File(data_dir.join("tasks.json")),
        }
    }

    pub fn load(&self) -> Result<TaskList> {
        match self {
            TaskSource::File(path) => TaskList::load(path),
            TaskSource::Sample => Ok(TaskList { tasks: sample_tasks()? }),
        }
    }
}

/// Load tasks into a fresh store and apply the filter flags.
pub fn build_store(source: &TaskSource, filter: &FilterArgs) -> Result<TriageStore> {
    let list = source.load()?;
    let mut store = TriageStore::new();
    store.load_tasks(list.tasks);
    store.set_filter(filter.to_patch()?);
    Ok(store)
}

/// Print task groups in a formatted table.
pub fn cmd_groups(source: &TaskSource, filter: &FilterArgs, children: bool, limit: Option<usize>) -> Result<()> {
    let store = build_store(source, filter)?;
    let visible = store.visible_groups();
    if visible.is_empty() {
        println!("No tasks found. Try adjusting your filters.");
        return Ok(());
    }

    println!(
        "{:<10} {:<11} {:<17} {:<6} {}",
        "Group", "Created", "State", "Tasks", "Name [batches]"
    );
    let shown = limit.unwrap_or(visible.len());
    for group in visible.iter().take(shown) {
        print_group_row(group);
        if children {
            for child in &group.children {
                print_child_row(child);
            }
        }
    }

    let (groups, tasks) = store.visible_totals();
    let plural = if groups == 1 { "" } else { "s" };
    println!("\n{groups} task group{plural} • {tasks} total tasks");
    Ok(())
}

fn print_group_row(group: &TaskGroup) {
    let parent = &group.ultimate_parent;
    let batches = if parent.correlation_ids.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parent.correlation_ids.join(","))
    };
    println!(
        "{:<10} {:<11} {:<17} {:<6} {}{}",
        truncate(&parent.id, 10),
        parent.created_day_in(&Local),
        parent.state.name(),
        group.total_count,
        parent.task_definition_display_name,
        batches
    );
}

fn print_child_row(task: &Task) {
    let label: Vec<&str> = ["PortfolioCode", "Ticker", "Name"]
        .iter()
        .filter_map(|name| task.field_text(name))
        .collect();
    let label = if label.is_empty() {
        task.task_definition_display_name.clone()
    } else {
        label.join(" · ")
    };
    println!(
        "  {:<8} {:<11} {:<17} {:<6} {}",
        truncate(&task.id, 8),
        task.created_day_in(&Local),
        task.state.name(),
        "",
        label
    );
    if let Some(err) = task.field_text("Error") {
        println!("  {:<45} ! {}", "", truncate(err, 80));
    }
}

/// Select the requested groups and tasks, then print the context block.
pub fn cmd_context(
    source: &TaskSource,
    groups: &[String],
    tasks: &[String],
    all_visible: bool,
    filter: &FilterArgs,
) -> Result<()> {
    let mut store = build_store(source, filter)?;

    if all_visible {
        let visible: Vec<TaskGroup> = store.visible_groups().into_iter().cloned().collect();
        info!(groups = visible.len(), "selecting all visible groups");
        for group in visible {
            store.select_group(group);
        }
    }
    for id in groups {
        let group = store
            .group(id)
            .cloned()
            .ok_or_else(|| Error::UnknownGroup(id.clone()))?;
        store.select_group(group);
    }
    for id in tasks {
        let task = store
            .task(id)
            .cloned()
            .ok_or_else(|| Error::UnknownTask(id.clone()))?;
        store.select_task(task);
    }

    for group in store.groups() {
        let marker = match store.group_selection(group) {
            GroupSelection::Full => "full",
            GroupSelection::Partial => "partial",
            GroupSelection::None => continue,
        };
        debug!(group = %group.id(), selection = marker, "group selection");
    }

    println!("{}", render_selection(&store));
    Ok(())
}

/// View a single task's details.
pub fn cmd_view(source: &TaskSource, id: &str) -> Result<()> {
    let list = source.load()?;
    let task = list.get(id).ok_or_else(|| Error::UnknownTask(id.to_string()))?;

    println!("ID:           {}", task.id);
    println!("Name:         {}", task.task_definition_display_name);
    println!(
        "Definition:   {}/{}",
        task.task_definition_id.scope, task.task_definition_id.code
    );
    println!("State:        {}", task.state);
    println!("Terminal:     {}", task.terminal_state);
    println!("Created:      {}", task.created_at().to_rfc3339());
    println!("Modified:     {}", task.version.as_at_modified.to_rfc3339());
    println!("Transition:   {}", task.as_at_last_transition.to_rfc3339());
    println!(
        "Parent:       {}",
        task.parent_task.as_ref().map(|r| r.id.as_str()).unwrap_or("-")
    );
    println!("Root:         {}", task.ultimate_parent_id().unwrap_or("-"));
    println!(
        "Batches:      {}",
        if task.correlation_ids.is_empty() {
            "-".to_string()
        } else {
            task.correlation_ids.join(",")
        }
    );
    if task.child_tasks.is_empty() {
        println!("Children:     -");
    } else {
        println!("Children:");
        for child in &task.child_tasks {
            println!("  - {} [{}] (#{})", child.task_definition_display_name, child.state, child.id);
        }
    }
    if !task.fields.is_empty() {
        println!("Fields:");
        for f in &task.fields {
            println!("  {:<20} {}", f.name, f.value);
        }
    }
    Ok(())
}

/// List all distinct states with their task counts.
pub fn cmd_states(source: &TaskSource) -> Result<()> {
    let list = source.load()?;
    println!("{:<17} {}", "State", "Count");
    for (state, c) in list.state_counts() {
        println!("{:<17} {}", state.name(), c);
    }
    Ok(())
}

/// List all distinct batches with their task counts.
pub fn cmd_batches(source: &TaskSource) -> Result<()> {
    let list = source.load()?;
    println!("{:<24} {}", "Batch", "Count");
    for (tag, c) in list.correlation_id_counts() {
        println!("{:<24} {}", truncate(tag, 24), c);
    }
    Ok(())
}

/// Print or update the persisted chat endpoint.
pub fn cmd_endpoint(data_dir: &Path, url: Option<String>) -> Result<()> {
    let path = preferences_path(data_dir);
    let mut prefs = Preferences::load(&path)?;
    match url {
        None => println!("{}", prefs.selected_endpoint),
        Some(url) => {
            prefs.selected_endpoint = url.trim().to_string();
            prefs.save(&path)?;
            println!("Endpoint set to {}", prefs.selected_endpoint);
        }
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SAMPLE_COMPLETED_PARENT_ID, SAMPLE_PARENT_ID};
    use chrono::NaiveDate;

    #[test]
    fn test_filter_args_to_patch() {
        let args = FilterArgs {
            from: Some("2025-08-01".into()),
            search: Some("errors".into()),
            states: vec![TaskState::Pending],
            batches: vec!["Early Morning DQ".into()],
            ..FilterArgs::default()
        };
        let patch = args.to_patch().unwrap();
        assert_eq!(patch.date_from, Some(NaiveDate::from_ymd_opt(2025, 8, 1)));
        assert_eq!(patch.date_to, None);
        assert_eq!(patch.search_query, Some(Some("errors".to_string())));
        assert_eq!(patch.search_scope, None);
        assert_eq!(patch.states.unwrap().unwrap().len(), 1);
        assert_eq!(patch.correlation_ids.unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_on_sets_both_bounds() {
        let args = FilterArgs {
            on: Some("2025-09-01".into()),
            ..FilterArgs::default()
        };
        let patch = args.to_patch().unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 9, 1);
        assert_eq!(patch.date_from, Some(day));
        assert_eq!(patch.date_to, Some(day));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let args = FilterArgs {
            from: Some("2025-09-02".into()),
            to: Some("2025-09-01".into()),
            ..FilterArgs::default()
        };
        assert!(matches!(args.to_patch(), Err(Error::EmptyDateRange { .. })));
    }

    #[test]
    fn test_task_source_resolution() {
        let dir = Path::new("/data");
        assert_eq!(
            TaskSource::resolve(Some(PathBuf::from("t.json")), false, dir),
            TaskSource::File(PathBuf::from("t.json"))
        );
        assert_eq!(TaskSource::resolve(None, true, dir), TaskSource::Sample);
        assert_eq!(
            TaskSource::resolve(None, false, dir),
            TaskSource::File(PathBuf::from("/data/tasks.json"))
        );
    }

    #[test]
    fn test_build_store_applies_filters() {
        let filter = FilterArgs {
            batches: vec!["Late Morning DQ".into()],
            ..FilterArgs::default()
        };
        let store = build_store(&TaskSource::Sample, &filter).unwrap();
        assert_eq!(store.groups().len(), 2);
        let visible: Vec<&str> = store.visible_groups().into_iter().map(|g| g.id()).collect();
        assert_eq!(visible, vec![SAMPLE_COMPLETED_PARENT_ID]);
    }

    #[test]
    fn test_context_rejects_unknown_ids() {
        let err = cmd_context(&TaskSource::Sample, &["nope".into()], &[], false, &FilterArgs::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownGroup(_)));
        let err = cmd_context(&TaskSource::Sample, &[], &["nope".into()], false, &FilterArgs::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTask(_)));
        cmd_context(&TaskSource::Sample, &[SAMPLE_PARENT_ID.into()], &[], false, &FilterArgs::default())
            .unwrap();
    }

    #[test]
    fn test_endpoint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        cmd_endpoint(dir.path(), Some(" http://localhost:9000 ".into())).unwrap();
        let prefs = Preferences::load(&preferences_path(dir.path())).unwrap();
        assert_eq!(prefs.selected_endpoint, "http://localhost:9000");
    }
}
