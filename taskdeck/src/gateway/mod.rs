//! Sync gateway abstraction for `TaskDeck`.
//!
//! Defines the [`SyncGateway`] trait that all persistence backends must
//! satisfy. Concrete implementations:
//! - [`memory::MemoryGateway`] — in-process store for tests and demo mode
//! - [`remote::RemoteGateway`] — WebSocket client for the hosted document store

pub mod memory;
pub mod remote;

use taskdeck_proto::gateway::BatchOp;
use taskdeck_proto::task::{Task, TaskDraft, TaskId, TaskPatch, UserId};

/// Errors that can occur during gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The connection to the store has been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// The operation timed out before completing.
    #[error("gateway operation timed out")]
    Timeout,

    /// The store rejected the operation.
    #[error("store rejected operation: {0}")]
    Rejected(String),

    /// A wire frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] taskdeck_proto::codec::CodecError),

    /// An underlying I/O error occurred.
    #[error("gateway I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Async interface to the remote document store.
///
/// The only seam through which task records are read or written. Callers
/// never see the store's API shape; they see typed operations over
/// [`Task`] records.
///
/// # Invariant
///
/// `query` returns only tasks owned by the given user, sorted ascending by
/// `order`. Mutations never touch another user's records.
pub trait SyncGateway: Send + Sync {
    /// Fetch all tasks owned by `user`, sorted ascending by `order`.
    fn query(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, GatewayError>> + Send;

    /// Insert a new task and return the id the store assigned.
    fn insert(
        &self,
        draft: TaskDraft,
    ) -> impl std::future::Future<Output = Result<TaskId, GatewayError>> + Send;

    /// Apply a partial update to one task.
    fn patch(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Delete one task.
    fn delete(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Execute several operations as one atomic unit.
    ///
    /// Either every operation commits or none does; a failed batch leaves
    /// the store exactly as it was.
    fn batch_write(
        &self,
        ops: Vec<BatchOp>,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;
}
