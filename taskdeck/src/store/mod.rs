//! Client-side task list mirror and mutation pipeline.
//!
//! [`TaskStore`] owns the signed-in user's task list as a local mirror of
//! the remote store. Every mutation validates locally, writes through the
//! [`SyncGateway`], then refreshes the mirror with a full reload. Reorder
//! is the exception: its batch already encodes the final state, so the
//! optimistic local result stands and a reload happens only on failure.

pub mod filter;
pub mod reorder;

use chrono::NaiveDate;

use taskdeck_proto::gateway::BatchOp;
use taskdeck_proto::task::{
    validate_text, DueDatePatch, Task, TaskDraft, TaskId, TaskPatch, UserId, ValidationError,
};

use crate::gateway::{GatewayError, SyncGateway};
use self::filter::{FilterCache, FilterMode};

/// Errors surfaced by store mutations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The input failed local validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The gateway rejected or failed the operation.
    #[error(transparent)]
    Sync(#[from] GatewayError),

    /// The id is not in the loaded list. Tasks outside the current user's
    /// list are never read or written.
    #[error("no task with id {0} in the loaded list")]
    UnknownTask(TaskId),
}

/// Local mirror of one user's task list, kept in sync through a gateway.
///
/// The mirror is authoritative for rendering and for validating mutations;
/// the remote store is authoritative for contents. [`load`](Self::load)
/// replaces the mirror wholesale, and every successful mutation except
/// [`move_task`](Self::move_task) triggers the same reload.
pub struct TaskStore<G> {
    gateway: G,
    user: Option<UserId>,
    tasks: Vec<Task>,
    filter_cache: FilterCache,
}

impl<G: SyncGateway> TaskStore<G> {
    /// Creates a store with no user and an empty mirror.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            user: None,
            tasks: Vec::new(),
            filter_cache: FilterCache::new(),
        }
    }

    /// Switches the signed-in user. The mirror is cleared immediately; call
    /// [`load`](Self::load) to populate it for the new user.
    pub fn set_user(&mut self, user: Option<UserId>) {
        self.user = user;
        self.tasks.clear();
    }

    /// The currently signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// The current mirror, ordered by `order` ascending.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Projects the mirror through `mode`, memoizing the result.
    #[must_use]
    pub fn visible(&self, mode: FilterMode) -> Vec<Task> {
        self.filter_cache.get(&self.tasks, mode)
    }

    /// Replaces the mirror with the remote list for the current user.
    ///
    /// With no user signed in the mirror is cleared and no query is sent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sync`] when the query fails; the previous
    /// mirror is kept.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        let Some(user) = self.user.clone() else {
            self.tasks.clear();
            return Ok(());
        };
        let tasks = self.gateway.query(&user).await?;
        tracing::debug!(count = tasks.len(), user = %user, "loaded task list");
        self.tasks = tasks;
        Ok(())
    }

    /// Adds a task at the end of the list.
    ///
    /// Returns `Ok(None)` without writing anything when no user is signed
    /// in or `text` trims to empty. The new task's `order` is the current
    /// list length, placing it last.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when the text exceeds the length
    /// limit, or [`StoreError::Sync`] when the insert fails.
    pub async fn add(
        &mut self,
        text: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<Option<TaskId>, StoreError> {
        let Some(user) = self.user.clone() else {
            return Ok(None);
        };
        let text = match validate_text(text) {
            Ok(trimmed) => trimmed.to_string(),
            Err(ValidationError::TextEmpty) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let draft = TaskDraft {
            user_id: user,
            text,
            is_completed: false,
            order: i64::try_from(self.tasks.len()).unwrap_or(i64::MAX),
            due_date,
        };
        let id = self.gateway.insert(draft).await?;
        self.refresh().await;
        Ok(Some(id))
    }

    /// Applies `patch` to a task in the loaded list.
    ///
    /// Text in the patch is validated and trimmed before sending. An empty
    /// patch, or no signed-in user, returns `Ok` without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for empty or over-long text,
    /// [`StoreError::UnknownTask`] when the id is not in the loaded list,
    /// or [`StoreError::Sync`] when the write fails.
    pub async fn update(&mut self, id: &TaskId, mut patch: TaskPatch) -> Result<(), StoreError> {
        if self.user.is_none() {
            return Ok(());
        }
        if let Some(text) = patch.text.take() {
            patch.text = Some(validate_text(&text)?.to_string());
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.require_local(id)?;
        self.gateway.patch(id, patch).await?;
        self.refresh().await;
        Ok(())
    }

    /// Flips a task's completion state. A no-op with no signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTask`] when the id is not in the loaded
    /// list, or [`StoreError::Sync`] when the write fails.
    pub async fn toggle(&mut self, id: &TaskId) -> Result<(), StoreError> {
        if self.user.is_none() {
            return Ok(());
        }
        let task = self.require_local(id)?;
        let patch = TaskPatch {
            is_completed: Some(!task.is_completed),
            ..TaskPatch::default()
        };
        self.gateway.patch(id, patch).await?;
        self.refresh().await;
        Ok(())
    }

    /// Sets or clears a task's due date. A no-op with no signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTask`] when the id is not in the loaded
    /// list, or [`StoreError::Sync`] when the write fails.
    pub async fn set_due_date(
        &mut self,
        id: &TaskId,
        due_date: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        if self.user.is_none() {
            return Ok(());
        }
        self.require_local(id)?;
        let patch = TaskPatch {
            due_date: Some(due_date.map_or(DueDatePatch::Clear, DueDatePatch::Set)),
            ..TaskPatch::default()
        };
        self.gateway.patch(id, patch).await?;
        self.refresh().await;
        Ok(())
    }

    /// Deletes a task from the list. A no-op with no signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownTask`] when the id is not in the loaded
    /// list, or [`StoreError::Sync`] when the delete fails.
    pub async fn remove(&mut self, id: &TaskId) -> Result<(), StoreError> {
        if self.user.is_none() {
            return Ok(());
        }
        self.require_local(id)?;
        self.gateway.delete(id).await?;
        self.refresh().await;
        Ok(())
    }

    /// Deletes every completed task in one atomic batch.
    ///
    /// Returns `Ok` without writing anything when no task is completed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sync`] when the batch fails; the remote list
    /// is unchanged in that case.
    pub async fn clear_completed(&mut self) -> Result<(), StoreError> {
        let ops: Vec<BatchOp> = self
            .tasks
            .iter()
            .filter(|t| t.is_completed)
            .map(|t| BatchOp::Delete { id: t.id.clone() })
            .collect();
        if ops.is_empty() {
            return Ok(());
        }
        let count = ops.len();
        self.gateway.batch_write(ops).await?;
        tracing::debug!(count, "cleared completed tasks");
        self.refresh().await;
        Ok(())
    }

    /// Moves `moved` to the position currently occupied by `target`.
    ///
    /// The mirror is updated optimistically and the order batch is sent.
    /// On success the optimistic result stands without a reload. On failure
    /// the mirror is rolled back by reloading from the remote list, and the
    /// write error is returned. Unknown ids and `moved == target` are
    /// no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sync`] when the order batch fails.
    pub async fn move_task(&mut self, moved: &TaskId, target: &TaskId) -> Result<(), StoreError> {
        if self.user.is_none() {
            return Ok(());
        }
        let Some(plan) = reorder::plan_move(&self.tasks, moved, target) else {
            return Ok(());
        };
        self.tasks = plan.tasks;
        if let Err(error) = self.gateway.batch_write(plan.updates).await {
            tracing::warn!(%error, "reorder batch failed, reloading");
            self.refresh().await;
            return Err(error.into());
        }
        Ok(())
    }

    fn require_local(&self, id: &TaskId) -> Result<&Task, StoreError> {
        self.tasks
            .iter()
            .find(|t| t.id == *id)
            .ok_or_else(|| StoreError::UnknownTask(id.clone()))
    }

    /// Reloads the mirror after a successful write. A failed reload keeps
    /// the previous mirror; the write itself already succeeded.
    async fn refresh(&mut self) {
        let Some(user) = self.user.clone() else {
            self.tasks.clear();
            return;
        };
        match self.gateway.query(&user).await {
            Ok(tasks) => self.tasks = tasks,
            Err(error) => {
                tracing::warn!(%error, "reload after mutation failed, keeping previous list");
            }
        }
    }
}

impl<G> TaskStore<G> {
    /// The underlying gateway, for callers that need direct access.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}
