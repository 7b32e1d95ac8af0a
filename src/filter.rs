//! Filter criteria and the group filter predicate.
//!
//! Criteria compose with AND across dimensions (date range, search, tags,
//! states). Within the tag and state dimensions a group passes if any member
//! hits any accepted value. A dimension that is absent or empty imposes no
//! constraint.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::fields::TaskState;
use crate::group::TaskGroup;
use crate::task::Task;

/// What free-text search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchScope {
    /// Display names and state names only.
    #[default]
    NamesAndStates,
    /// Also field names and values (ticker, portfolio code, error text...).
    IncludeFields,
}

/// Active filter criteria for the task panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<BTreeSet<TaskState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_ids: Option<BTreeSet<String>>,
    #[serde(default)]
    pub search_scope: SearchScope,
}

impl FilterCriteria {
    /// Shallow-merge a patch: fields the patch leaves untouched keep their value.
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(v) = patch.date_from {
            self.date_from = v;
        }
        if let Some(v) = patch.date_to {
            self.date_to = v;
        }
        if let Some(v) = patch.search_query {
            self.search_query = v;
        }
        if let Some(v) = patch.states {
            self.states = v;
        }
        if let Some(v) = patch.correlation_ids {
            self.correlation_ids = v;
        }
        if let Some(v) = patch.search_scope {
            self.search_scope = v;
        }
    }

    /// True when no dimension constrains the output.
    pub fn is_unconstrained(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.search_query.as_deref().map_or(true, str::is_empty)
            && self.states.as_ref().map_or(true, BTreeSet::is_empty)
            && self.correlation_ids.as_ref().map_or(true, BTreeSet::is_empty)
    }
}

/// Partial update of `FilterCriteria`.
///
/// Outer `None` keeps the current value, `Some(None)` clears it and
/// `Some(Some(v))` replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub date_from: Option<Option<NaiveDate>>,
    pub date_to: Option<Option<NaiveDate>>,
    pub search_query: Option<Option<String>>,
    pub states: Option<Option<BTreeSet<TaskState>>>,
    pub correlation_ids: Option<Option<BTreeSet<String>>>,
    pub search_scope: Option<SearchScope>,
}

impl FilterPatch {
    pub fn date_from(mut self, v: Option<NaiveDate>) -> Self {
        self.date_from = Some(v);
        self
    }

    pub fn date_to(mut self, v: Option<NaiveDate>) -> Self {
        self.date_to = Some(v);
        self
    }

    /// Restrict to a single calendar day, or clear both bounds.
    pub fn on_day(self, day: Option<NaiveDate>) -> Self {
        self.date_from(day).date_to(day)
    }

    pub fn search_query(mut self, v: Option<&str>) -> Self {
        self.search_query = Some(v.map(str::to_string));
        self
    }

    /// An empty iterator clears the state constraint.
    pub fn states<I: IntoIterator<Item = TaskState>>(mut self, states: I) -> Self {
        let set: BTreeSet<TaskState> = states.into_iter().collect();
        self.states = Some((!set.is_empty()).then_some(set));
        self
    }

    /// An empty iterator clears the correlation tag constraint.
    pub fn correlation_ids<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        self.correlation_ids = Some((!set.is_empty()).then_some(set));
        self
    }

    pub fn search_scope(mut self, v: SearchScope) -> Self {
        self.search_scope = Some(v);
        self
    }
}

/// Evaluate the criteria against a group, bucketing dates in the local time zone.
pub fn matches_filter(group: &TaskGroup, criteria: &FilterCriteria) -> bool {
    matches_filter_in(group, criteria, &Local)
}

/// Evaluate the criteria against a group, bucketing dates in `tz`.
pub fn matches_filter_in<Tz: TimeZone>(group: &TaskGroup, criteria: &FilterCriteria, tz: &Tz) -> bool {
    matches_dates(group, criteria, tz)
        && matches_search(group, criteria)
        && matches_correlation_ids(group, criteria)
        && matches_states(group, criteria)
}

/// Groups passing the criteria, in their existing order.
pub fn filter_groups<'a>(groups: &'a [TaskGroup], criteria: &FilterCriteria) -> Vec<&'a TaskGroup> {
    filter_groups_in(groups, criteria, &Local)
}

pub fn filter_groups_in<'a, Tz: TimeZone>(
    groups: &'a [TaskGroup],
    criteria: &FilterCriteria,
    tz: &Tz,
) -> Vec<&'a TaskGroup> {
    groups
        .iter()
        .filter(|g| matches_filter_in(g, criteria, tz))
        .collect()
}

fn matches_dates<Tz: TimeZone>(group: &TaskGroup, criteria: &FilterCriteria, tz: &Tz) -> bool {
    if criteria.date_from.is_none() && criteria.date_to.is_none() {
        return true;
    }
    let day = group.ultimate_parent.created_day_in(tz);
    if let Some(from) = criteria.date_from {
        if day < from {
            return false;
        }
    }
    if let Some(to) = criteria.date_to {
        if day > to {
            return false;
        }
    }
    true
}

fn matches_search(group: &TaskGroup, criteria: &FilterCriteria) -> bool {
    let query = match criteria.search_query.as_deref() {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return true,
    };
    let include_fields = criteria.search_scope == SearchScope::IncludeFields;
    group
        .members()
        .any(|t| task_matches_query(t, &query, include_fields))
}

fn task_matches_query(task: &Task, query: &str, include_fields: bool) -> bool {
    if task.task_definition_display_name.to_lowercase().contains(query)
        || task.state.name().to_lowercase().contains(query)
    {
        return true;
    }
    include_fields
        && task.fields.iter().any(|f| {
            f.name.to_lowercase().contains(query)
                || (!f.value.is_null() && f.value.to_string().to_lowercase().contains(query))
        })
}

fn matches_correlation_ids(group: &TaskGroup, criteria: &FilterCriteria) -> bool {
    let accepted = match criteria.correlation_ids.as_ref() {
        Some(set) if !set.is_empty() => set,
        _ => return true,
    };
    group
        .members()
        .flat_map(|t| t.correlation_ids.iter())
        .any(|tag| accepted.contains(tag))
}

fn matches_states(group: &TaskGroup, criteria: &FilterCriteria) -> bool {
    let accepted = match criteria.states.as_ref() {
        Some(set) if !set.is_empty() => set,
        _ => return true,
    };
    group.members().any(|t| accepted.contains(&t.state))
}
