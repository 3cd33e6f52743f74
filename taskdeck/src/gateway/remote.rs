//! WebSocket gateway to the hosted document store.
//!
//! Implements [`SyncGateway`] over a WebSocket connection speaking JSON text
//! frames. Requests carry correlation ids; a background reader task resolves
//! each pending request when its response arrives, so one connection can
//! serve concurrent operations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use taskdeck_proto::codec;
use taskdeck_proto::gateway::{BatchOp, GatewayRequest, RequestOp, ResponseBody};
use taskdeck_proto::task::{Task, TaskDraft, TaskId, TaskPatch, UserId};

use super::{GatewayError, SyncGateway};

/// Type alias for the write half of a WebSocket connection.
type WsSender = futures_util::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

/// Type alias for the read half of a WebSocket connection.
type WsReader =
    futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Map of in-flight requests awaiting their response.
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<ResponseBody>>>>;

/// Default timeout for connecting to the store.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single request/response exchange.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket client implementing the [`SyncGateway`] trait.
///
/// Created via [`RemoteGateway::connect`], which establishes the WebSocket
/// connection and spawns a background reader task. Each operation sends one
/// request frame and awaits the correlated response through a oneshot
/// channel registered in the pending map.
pub struct RemoteGateway {
    /// The store endpoint URL (ws:// or wss://).
    store_url: String,
    /// Write half of the WebSocket connection (shared for concurrent sends).
    ws_sender: Arc<Mutex<WsSender>>,
    /// In-flight requests keyed by request id.
    pending: PendingMap,
    /// Next request correlation id.
    next_request_id: AtomicU64,
    /// Whether the WebSocket connection to the store is active.
    connected: Arc<AtomicBool>,
    /// Timeout applied to each request/response exchange.
    request_timeout: Duration,
    /// Handle to the background reader task (kept alive for the gateway's lifetime).
    _reader_handle: tokio::task::JoinHandle<()>,
}

impl RemoteGateway {
    /// Connect to the document store with default timeouts.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Rejected`] if `store_url` is not a valid URL.
    /// - [`GatewayError::Timeout`] if the connection attempt times out.
    /// - [`GatewayError::ConnectionClosed`] or [`GatewayError::Io`] if the
    ///   endpoint cannot be reached.
    pub async fn connect(store_url: &str) -> Result<Self, GatewayError> {
        Self::connect_with_timeouts(store_url, CONNECT_TIMEOUT, REQUEST_TIMEOUT).await
    }

    /// Connect with explicit connect and per-request timeouts.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteGateway::connect`].
    pub async fn connect_with_timeouts(
        store_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let url = Url::parse(store_url)
            .map_err(|e| GatewayError::Rejected(format!("invalid store URL: {e}")))?;

        let (ws_stream, _response) =
            tokio::time::timeout(connect_timeout, connect_async(url.as_str()))
                .await
                .map_err(|_| {
                    tracing::warn!(url = store_url, "store WebSocket connect timed out");
                    GatewayError::Timeout
                })?
                .map_err(|e| {
                    tracing::warn!(url = store_url, err = %e, "store WebSocket connect failed");
                    map_ws_connect_error(e)
                })?;

        let (ws_sender, ws_reader) = ws_stream.split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));
        let reader_pending = Arc::clone(&pending);
        let reader_connected = Arc::clone(&connected);

        let reader_handle = tokio::spawn(reader_loop(ws_reader, reader_pending, reader_connected));

        tracing::info!(url = store_url, "connected to document store");

        Ok(Self {
            store_url: store_url.to_string(),
            ws_sender: Arc::new(Mutex::new(ws_sender)),
            pending,
            next_request_id: AtomicU64::new(1),
            connected,
            request_timeout,
            _reader_handle: reader_handle,
        })
    }

    /// Return the store URL this gateway is connected to.
    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    /// Check whether the connection to the store is currently active.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Send one request frame and await the correlated response.
    async fn request(&self, op: RequestOp) -> Result<ResponseBody, GatewayError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(GatewayError::ConnectionClosed);
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id, tx);

        let frame = codec::encode_request(&GatewayRequest { request_id, op })?;

        let send_result = {
            let mut sender = self.ws_sender.lock().await;
            sender.send(Message::Text(frame.into())).await
        };
        if let Err(e) = send_result {
            tracing::warn!(err = %e, "store request send failed");
            self.pending.lock().await.remove(&request_id);
            self.connected.store(false, Ordering::Relaxed);
            return Err(GatewayError::ConnectionClosed);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(body)) => Ok(body),
            // The reader task dropped the sender: connection is gone.
            Ok(Err(_)) => Err(GatewayError::ConnectionClosed),
            Err(_) => {
                tracing::warn!(request_id, "store request timed out");
                self.pending.lock().await.remove(&request_id);
                Err(GatewayError::Timeout)
            }
        }
    }
}

impl SyncGateway for RemoteGateway {
    async fn query(&self, user: &UserId) -> Result<Vec<Task>, GatewayError> {
        match self
            .request(RequestOp::Query {
                user_id: user.clone(),
            })
            .await?
        {
            ResponseBody::Records(tasks) => Ok(tasks),
            ResponseBody::Error(reason) => Err(GatewayError::Rejected(reason)),
            other => Err(unexpected_body("Records", &other)),
        }
    }

    async fn insert(&self, draft: TaskDraft) -> Result<TaskId, GatewayError> {
        match self.request(RequestOp::Insert { draft }).await? {
            ResponseBody::Inserted(id) => Ok(id),
            ResponseBody::Error(reason) => Err(GatewayError::Rejected(reason)),
            other => Err(unexpected_body("Inserted", &other)),
        }
    }

    async fn patch(&self, id: &TaskId, patch: TaskPatch) -> Result<(), GatewayError> {
        match self
            .request(RequestOp::Patch {
                id: id.clone(),
                patch,
            })
            .await?
        {
            ResponseBody::Ack => Ok(()),
            ResponseBody::Error(reason) => Err(GatewayError::Rejected(reason)),
            other => Err(unexpected_body("Ack", &other)),
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<(), GatewayError> {
        match self.request(RequestOp::Delete { id: id.clone() }).await? {
            ResponseBody::Ack => Ok(()),
            ResponseBody::Error(reason) => Err(GatewayError::Rejected(reason)),
            other => Err(unexpected_body("Ack", &other)),
        }
    }

    async fn batch_write(&self, ops: Vec<BatchOp>) -> Result<(), GatewayError> {
        match self.request(RequestOp::Batch { ops }).await? {
            ResponseBody::Ack => Ok(()),
            ResponseBody::Error(reason) => Err(GatewayError::Rejected(reason)),
            other => Err(unexpected_body("Ack", &other)),
        }
    }
}

/// Background task that reads response frames and resolves pending requests.
///
/// Malformed frames are logged and skipped; the task does not disconnect on
/// bad data. When the connection closes, all in-flight requests are dropped
/// so their callers observe `ConnectionClosed`.
async fn reader_loop(mut ws_reader: WsReader, pending: PendingMap, connected: Arc<AtomicBool>) {
    while let Some(msg_result) = ws_reader.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match codec::decode_response(&text) {
                Ok(response) => {
                    let waiter = pending.lock().await.remove(&response.request_id);
                    if let Some(tx) = waiter {
                        // Receiver may have timed out; nothing to do then.
                        let _ = tx.send(response.body);
                    } else {
                        tracing::debug!(
                            request_id = response.request_id,
                            "response for unknown or expired request"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(err = %e, "malformed store frame, skipping");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!("store WebSocket closed by server");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_)) => {
                // Only text frames carry protocol data.
            }
            Err(e) => {
                tracing::warn!(err = %e, "store WebSocket read error");
                break;
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    pending.lock().await.clear();
    tracing::info!("store reader task exiting");
}

/// Error for a response body that does not match the request kind.
fn unexpected_body(expected: &str, got: &ResponseBody) -> GatewayError {
    GatewayError::Io(std::io::Error::other(format!(
        "expected {expected} response, got {got:?}"
    )))
}

/// Map a `tokio_tungstenite` connection error to a [`GatewayError`].
fn map_ws_connect_error(err: tokio_tungstenite::tungstenite::Error) -> GatewayError {
    use tokio_tungstenite::tungstenite::Error as WsError;
    match err {
        WsError::Io(io_err) => GatewayError::Io(io_err),
        WsError::Http(response) => GatewayError::Io(std::io::Error::other(format!(
            "store HTTP error: status {}",
            response.status()
        ))),
        other => GatewayError::Io(std::io::Error::other(format!(
            "store connection error: {other}"
        ))),
    }
}
