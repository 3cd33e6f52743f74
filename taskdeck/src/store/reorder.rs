//! Move planning for task reordering.
//!
//! Turns a `(moved, target)` drag event into the new task sequence and the
//! batch of order updates that persists it. Pure functions over slices; the
//! store applies the plan optimistically and sends the batch.

use taskdeck_proto::gateway::BatchOp;
use taskdeck_proto::task::{Task, TaskId, TaskPatch};

/// Result of planning a move: the reordered sequence and the batch that
/// persists it.
///
/// `updates` contains one order update per element of `tasks`, setting
/// `order = index`. The batch commits atomically or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// The task list after the move, with `order` rewritten to each task's
    /// new index.
    pub tasks: Vec<Task>,
    /// Atomic batch persisting the new order.
    pub updates: Vec<BatchOp>,
}

/// Plans moving `moved` to the position currently occupied by `target`.
///
/// Standard array-move semantics: the moved element is removed and
/// reinserted at the target's original index; everything between shifts by
/// one. Returns `None` when `moved == target` or either id is not in
/// `tasks`, meaning nothing should change and nothing should be written.
#[must_use]
pub fn plan_move(tasks: &[Task], moved: &TaskId, target: &TaskId) -> Option<MovePlan> {
    if moved == target {
        return None;
    }
    let from = tasks.iter().position(|t| t.id == *moved)?;
    let to = tasks.iter().position(|t| t.id == *target)?;

    let mut reordered: Vec<Task> = tasks.to_vec();
    let moved_task = reordered.remove(from);
    reordered.insert(to, moved_task);

    let mut updates = Vec::with_capacity(reordered.len());
    for (index, task) in reordered.iter_mut().enumerate() {
        let order = i64::try_from(index).unwrap_or(i64::MAX);
        task.order = order;
        updates.push(BatchOp::Update {
            id: task.id.clone(),
            patch: TaskPatch {
                order: Some(order),
                ..TaskPatch::default()
            },
        });
    }

    Some(MovePlan {
        tasks: reordered,
        updates,
    })
}
