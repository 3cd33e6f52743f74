//! Task record types for `TaskDeck`.
//!
//! Defines the single persisted entity (the task), its identifiers, the
//! insert/patch payload shapes used by the gateway, and text validation
//! applied before any remote call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task text length in characters.
pub const MAX_TASK_TEXT_LENGTH: usize = 256;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning a task.
///
/// Opaque to this crate; the identity provider decides its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identifier from a string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this user ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted task record.
///
/// `order` defines the task's position within its owner's list; the values
/// of one owner's tasks sorted ascending reproduce display order. Exact
/// numeric spacing carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, assigned by the store on insert.
    pub id: TaskId,
    /// Owner of this task. Ownership never changes.
    pub user_id: UserId,
    /// Display text. Non-empty after trimming.
    pub text: String,
    /// Whether the task has been completed.
    pub is_completed: bool,
    /// Position within the owner's list.
    pub order: i64,
    /// Optional due date, day granularity.
    pub due_date: Option<NaiveDate>,
}

/// Payload for inserting a new task. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Owner of the new task.
    pub user_id: UserId,
    /// Display text. Non-empty after trimming.
    pub text: String,
    /// Initial completion state.
    pub is_completed: bool,
    /// Initial position within the owner's list.
    pub order: i64,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

/// Change to the optional due date inside a [`TaskPatch`].
///
/// A dedicated enum rather than nested `Option`s so that "leave unchanged"
/// and "clear the date" stay distinguishable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DueDatePatch {
    /// Set the due date to the given day.
    Set(NaiveDate),
    /// Remove the due date.
    Clear,
}

/// Partial update to a single task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New display text, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New completion state, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    /// New position, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Due date change, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDatePatch>,
}

impl TaskPatch {
    /// Returns `true` if this patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.is_completed.is_none()
            && self.order.is_none()
            && self.due_date.is_none()
    }
}

/// Errors raised by local input validation, before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Task text is empty or whitespace-only after trimming.
    #[error("task text is empty")]
    TextEmpty,

    /// Task text exceeds [`MAX_TASK_TEXT_LENGTH`] characters.
    #[error("task text exceeds {MAX_TASK_TEXT_LENGTH} characters")]
    TextTooLong,
}

/// Trims task text and validates it.
///
/// Returns the trimmed text on success.
///
/// # Errors
///
/// Returns [`ValidationError::TextEmpty`] if nothing remains after trimming,
/// or [`ValidationError::TextTooLong`] if the trimmed text exceeds
/// [`MAX_TASK_TEXT_LENGTH`] characters.
pub fn validate_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::TextEmpty);
    }
    if trimmed.chars().count() > MAX_TASK_TEXT_LENGTH {
        return Err(ValidationError::TextTooLong);
    }
    Ok(trimmed)
}
