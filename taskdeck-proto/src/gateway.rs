//! Wire protocol messages for the `TaskDeck` sync gateway.
//!
//! One WebSocket connection multiplexes concurrent operations; every request
//! carries a `request_id` echoed back in the matching response so the client
//! can correlate replies out of order.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskDraft, TaskId, TaskPatch, UserId};

/// One operation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOp {
    /// Apply a partial update to one task.
    Update {
        /// Task to update.
        id: TaskId,
        /// Fields to change.
        patch: TaskPatch,
    },
    /// Delete one task.
    Delete {
        /// Task to delete.
        id: TaskId,
    },
}

/// Operations the client can request from the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOp {
    /// Fetch all tasks owned by `user_id`, sorted ascending by `order`.
    Query {
        /// Owner whose tasks to fetch.
        user_id: UserId,
    },
    /// Insert a new task; the store assigns and returns the id.
    Insert {
        /// The task to create.
        draft: TaskDraft,
    },
    /// Apply a partial update to one task.
    Patch {
        /// Task to update.
        id: TaskId,
        /// Fields to change.
        patch: TaskPatch,
    },
    /// Delete one task.
    Delete {
        /// Task to delete.
        id: TaskId,
    },
    /// Execute several operations atomically. The whole batch commits or
    /// none of it does.
    Batch {
        /// Operations to apply as one unit.
        ops: Vec<BatchOp>,
    },
}

/// A client request with its correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Correlation id, echoed back in the response.
    pub request_id: u64,
    /// The requested operation.
    pub op: RequestOp,
}

/// Response payloads from the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseBody {
    /// Result of a `Query`: the owner's tasks sorted ascending by `order`.
    Records(Vec<Task>),
    /// Result of an `Insert`: the assigned task id.
    Inserted(TaskId),
    /// Successful `Patch`, `Delete`, or `Batch`.
    Ack,
    /// The operation was rejected or failed; human-readable reason.
    Error(String),
}

/// A store response correlated to the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Correlation id of the originating request.
    pub request_id: u64,
    /// The response payload.
    pub body: ResponseBody,
}
