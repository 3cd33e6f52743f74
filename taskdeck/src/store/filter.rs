//! Filter projection and due-date classification.
//!
//! [`apply`] projects a task list through a [`FilterMode`] without mutating
//! it. [`FilterCache`] memoizes the last projection so repeated renders of
//! an unchanged list reuse the previous result. [`classify_due`] buckets a
//! task's due date relative to a reference day.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

use taskdeck_proto::task::Task;

/// Which subset of the task list to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Every task, completed or not.
    #[default]
    All,
    /// Only tasks not yet completed.
    Active,
    /// Only completed tasks.
    Completed,
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unknown filter '{other}', expected all, active or completed"
            )),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        };
        write!(f, "{name}")
    }
}

/// Projects `tasks` through `mode`, preserving the incoming order.
///
/// Pure function: the input is never mutated and the returned vector owns
/// clones of the selected tasks.
#[must_use]
pub fn apply(tasks: &[Task], mode: FilterMode) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| match mode {
            FilterMode::All => true,
            FilterMode::Active => !t.is_completed,
            FilterMode::Completed => t.is_completed,
        })
        .cloned()
        .collect()
}

struct CacheEntry {
    tasks: Vec<Task>,
    mode: FilterMode,
    result: Vec<Task>,
}

/// Memoized wrapper over [`apply`].
///
/// Holds the last `(tasks, mode)` pair and its projection. A lookup with an
/// equal pair returns the cached result; anything else recomputes and
/// replaces the entry.
#[derive(Default)]
pub struct FilterCache {
    inner: Mutex<Option<CacheEntry>>,
}

impl FilterCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the projection of `tasks` through `mode`, reusing the cached
    /// result when both inputs match the previous call.
    #[must_use]
    pub fn get(&self, tasks: &[Task], mode: FilterMode) -> Vec<Task> {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.as_ref()
            && entry.mode == mode
            && entry.tasks == tasks
        {
            return entry.result.clone();
        }
        let result = apply(tasks, mode);
        *inner = Some(CacheEntry {
            tasks: tasks.to_vec(),
            mode,
            result: result.clone(),
        });
        result
    }
}

/// Due-date bucket relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    /// Due before the reference day.
    Past,
    /// Due on the reference day.
    Today,
    /// Due the day after the reference day.
    Tomorrow,
}

impl fmt::Display for DueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Past => "past",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
        };
        write!(f, "{name}")
    }
}

/// Buckets `task`'s due date relative to `today`, at day granularity.
///
/// Returns `None` for completed tasks, tasks without a due date, and due
/// dates more than one day ahead.
#[must_use]
pub fn classify_due(task: &Task, today: NaiveDate) -> Option<DueStatus> {
    if task.is_completed {
        return None;
    }
    let due = task.due_date?;
    if due < today {
        Some(DueStatus::Past)
    } else if due == today {
        Some(DueStatus::Today)
    } else if today.succ_opt() == Some(due) {
        Some(DueStatus::Tomorrow)
    } else {
        None
    }
}

/// [`classify_due`] against the current UTC date.
#[must_use]
pub fn classify_due_now(task: &Task) -> Option<DueStatus> {
    classify_due(task, Utc::now().date_naive())
}
