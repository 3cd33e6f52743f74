//! In-memory gateway for tests and demo mode.
//!
//! Implements [`SyncGateway`] over a [`tokio::sync::RwLock`]-guarded map.
//! Batches are genuinely atomic: every operation is validated against the
//! current map before any of them is applied. Write failure can be injected
//! to exercise rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use taskdeck_proto::gateway::BatchOp;
use taskdeck_proto::task::{DueDatePatch, Task, TaskDraft, TaskId, TaskPatch, UserId};

use super::{GatewayError, SyncGateway};

/// In-process document store backed by a `HashMap`.
///
/// Thread-safe via [`RwLock`]. Ids are assigned on insert, as the hosted
/// store would. Setting [`set_fail_writes`](Self::set_fail_writes) makes
/// every mutation fail while leaving queries untouched.
#[derive(Default)]
pub struct MemoryGateway {
    records: RwLock<HashMap<TaskId, Task>>,
    fail_writes: AtomicBool,
}

impl MemoryGateway {
    /// Creates a new, empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle injected write failure. While set, every insert/patch/delete/
    /// batch returns an error and changes nothing; queries still succeed.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Returns the total number of stored records, across all users.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_writable(&self) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(GatewayError::Rejected("injected write failure".to_string()));
        }
        Ok(())
    }
}

/// Applies a [`TaskPatch`] to a task in place.
pub(crate) fn apply_patch(task: &mut Task, patch: &TaskPatch) {
    if let Some(text) = &patch.text {
        task.text.clone_from(text);
    }
    if let Some(is_completed) = patch.is_completed {
        task.is_completed = is_completed;
    }
    if let Some(order) = patch.order {
        task.order = order;
    }
    match patch.due_date {
        Some(DueDatePatch::Set(date)) => task.due_date = Some(date),
        Some(DueDatePatch::Clear) => task.due_date = None,
        None => {}
    }
}

impl SyncGateway for MemoryGateway {
    async fn query(&self, user: &UserId) -> Result<Vec<Task>, GatewayError> {
        let records = self.records.read().await;
        let mut tasks: Vec<Task> = records
            .values()
            .filter(|t| t.user_id == *user)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.order);
        Ok(tasks)
    }

    async fn insert(&self, draft: TaskDraft) -> Result<TaskId, GatewayError> {
        self.check_writable()?;
        let id = TaskId::new();
        let task = Task {
            id: id.clone(),
            user_id: draft.user_id,
            text: draft.text,
            is_completed: draft.is_completed,
            order: draft.order,
            due_date: draft.due_date,
        };
        self.records.write().await.insert(id.clone(), task);
        Ok(id)
    }

    async fn patch(&self, id: &TaskId, patch: TaskPatch) -> Result<(), GatewayError> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let task = records
            .get_mut(id)
            .ok_or_else(|| GatewayError::Rejected(format!("no task with id {id}")))?;
        apply_patch(task, &patch);
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), GatewayError> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        records
            .remove(id)
            .ok_or_else(|| GatewayError::Rejected(format!("no task with id {id}")))?;
        Ok(())
    }

    async fn batch_write(&self, ops: Vec<BatchOp>) -> Result<(), GatewayError> {
        self.check_writable()?;
        let mut records = self.records.write().await;

        // Validate the whole batch before touching anything.
        for op in &ops {
            let id = match op {
                BatchOp::Update { id, .. } | BatchOp::Delete { id } => id,
            };
            if !records.contains_key(id) {
                return Err(GatewayError::Rejected(format!("no task with id {id}")));
            }
        }

        for op in ops {
            match op {
                BatchOp::Update { id, patch } => {
                    if let Some(task) = records.get_mut(&id) {
                        apply_patch(task, &patch);
                    }
                }
                BatchOp::Delete { id } => {
                    records.remove(&id);
                }
            }
        }
        Ok(())
    }
}
