//! Integration tests for the WebSocket store gateway.
//!
//! Runs a real WebSocket server implementing the document-store protocol
//! over an in-process map, then drives a full [`TaskStore`] through it:
//! add, edit, toggle, reorder, and clear flows against actual frames on a
//! real socket.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use taskdeck::gateway::remote::RemoteGateway;
use taskdeck::gateway::GatewayError;
use taskdeck::store::{StoreError, TaskStore};
use taskdeck_proto::codec;
use taskdeck_proto::gateway::{BatchOp, GatewayResponse, RequestOp, ResponseBody};
use taskdeck_proto::task::{DueDatePatch, Task, TaskId, TaskPatch, UserId};

type Records = Arc<Mutex<HashMap<TaskId, Task>>>;

/// Applies a patch to a stored task, server-side.
fn apply_patch(task: &mut Task, patch: &TaskPatch) {
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

/// Computes the response for one request against the shared map.
///
/// Mirrors the hosted store's semantics: queries are scoped and sorted,
/// batches validate every id before applying anything.
async fn respond(records: &Records, op: RequestOp) -> ResponseBody {
    let mut records = records.lock().await;
    match op {
        RequestOp::Query { user_id } => {
            let mut tasks: Vec<Task> = records
                .values()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect();
            tasks.sort_by_key(|t| t.order);
            ResponseBody::Records(tasks)
        }
        RequestOp::Insert { draft } => {
            let id = TaskId::new();
            records.insert(
                id.clone(),
                Task {
                    id: id.clone(),
                    user_id: draft.user_id,
                    text: draft.text,
                    is_completed: draft.is_completed,
                    order: draft.order,
                    due_date: draft.due_date,
                },
            );
            ResponseBody::Inserted(id)
        }
        RequestOp::Patch { id, patch } => match records.get_mut(&id) {
            Some(task) => {
                apply_patch(task, &patch);
                ResponseBody::Ack
            }
            None => ResponseBody::Error(format!("no task with id {id}")),
        },
        RequestOp::Delete { id } => match records.remove(&id) {
            Some(_) => ResponseBody::Ack,
            None => ResponseBody::Error(format!("no task with id {id}")),
        },
        RequestOp::Batch { ops } => {
            for op in &ops {
                let id = match op {
                    BatchOp::Update { id, .. } | BatchOp::Delete { id } => id,
                };
                if !records.contains_key(id) {
                    return ResponseBody::Error(format!("no task with id {id}"));
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
            ResponseBody::Ack
        }
    }
}

/// Serves the store protocol on one accepted connection.
async fn serve(mut ws: WebSocketStream<TcpStream>, records: Records) {
    while let Some(Ok(msg)) = ws.next().await {
        if let Message::Text(text) = msg {
            let request = codec::decode_request(&text).unwrap();
            let body = respond(&records, request.op).await;
            let reply = codec::encode_response(&GatewayResponse {
                request_id: request.request_id,
                body,
            })
            .unwrap();
            ws.send(Message::Text(reply.into())).await.unwrap();
        }
    }
}

/// Starts a one-connection store server; returns its URL and backing map.
async fn start_store_server() -> (String, Records, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("ws://{addr}/store");
    let records: Records = Arc::new(Mutex::new(HashMap::new()));
    let server_records = Arc::clone(&records);

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        serve(ws, server_records).await;
    });

    (url, records, handle)
}

async fn connected_store(url: &str, user: &str) -> TaskStore<RemoteGateway> {
    let gateway = RemoteGateway::connect(url).await.unwrap();
    let mut store = TaskStore::new(gateway);
    store.set_user(Some(UserId::new(user)));
    store.load().await.unwrap();
    store
}

fn texts(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.text.as_str()).collect()
}

#[tokio::test]
async fn add_round_trips_through_the_wire() {
    let (url, records, _handle) = start_store_server().await;
    let mut store = connected_store(&url, "alice").await;

    let id = store.add("buy milk", None).await.unwrap().unwrap();
    assert_eq!(texts(store.tasks()), vec!["buy milk"]);
    assert_eq!(store.tasks()[0].order, 0);

    let stored = records.lock().await.get(&id).cloned().unwrap();
    assert_eq!(stored.text, "buy milk");
    assert_eq!(stored.user_id, UserId::new("alice"));
}

#[tokio::test]
async fn full_session_over_one_connection() {
    let (url, _records, _handle) = start_store_server().await;
    let mut store = connected_store(&url, "alice").await;

    let a = store.add("write report", None).await.unwrap().unwrap();
    store.add("review queue", None).await.unwrap();
    let c = store.add("send invoices", None).await.unwrap().unwrap();
    assert_eq!(
        texts(store.tasks()),
        vec!["write report", "review queue", "send invoices"]
    );

    store.toggle(&a).await.unwrap();
    assert!(store.tasks()[0].is_completed);

    store
        .update(
            &c,
            TaskPatch {
                text: Some("send invoices (Q3)".to_string()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(store.tasks()[2].text, "send invoices (Q3)");

    store.move_task(&c, &a).await.unwrap();
    assert_eq!(
        texts(store.tasks()),
        vec!["send invoices (Q3)", "write report", "review queue"]
    );

    store.clear_completed().await.unwrap();
    assert_eq!(
        texts(store.tasks()),
        vec!["send invoices (Q3)", "review queue"]
    );
}

#[tokio::test]
async fn reorder_batch_persists_on_the_server() {
    let (url, records, _handle) = start_store_server().await;
    let mut store = connected_store(&url, "alice").await;

    let a = store.add("a", None).await.unwrap().unwrap();
    store.add("b", None).await.unwrap();
    let c = store.add("c", None).await.unwrap().unwrap();

    store.move_task(&a, &c).await.unwrap();

    // Server-side orders match the optimistic mirror.
    let mut stored: Vec<Task> = records.lock().await.values().cloned().collect();
    stored.sort_by_key(|t| t.order);
    assert_eq!(texts(&stored), vec!["b", "c", "a"]);
    let orders: Vec<i64> = stored.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[tokio::test]
async fn query_only_sees_own_tasks() {
    let (url, records, _handle) = start_store_server().await;

    // A foreign record planted directly in the server map.
    let foreign = Task {
        id: TaskId::new(),
        user_id: UserId::new("bob"),
        text: "his".to_string(),
        is_completed: false,
        order: 0,
        due_date: None,
    };
    records.lock().await.insert(foreign.id.clone(), foreign);

    let mut store = connected_store(&url, "alice").await;
    assert!(store.tasks().is_empty());

    store.add("hers", None).await.unwrap();
    assert_eq!(texts(store.tasks()), vec!["hers"]);
}

#[tokio::test]
async fn server_rejection_surfaces_and_mirror_recovers() {
    let (url, records, _handle) = start_store_server().await;
    let mut store = connected_store(&url, "alice").await;

    let a = store.add("a", None).await.unwrap().unwrap();
    store.add("b", None).await.unwrap();
    let c = store.add("c", None).await.unwrap().unwrap();

    // Remove a record behind the store's back so the reorder batch fails
    // server-side validation.
    records.lock().await.remove(&a);

    let result = store.move_task(&c, &a).await;
    assert!(matches!(
        result,
        Err(StoreError::Sync(GatewayError::Rejected(_)))
    ));

    // The rollback reload reflects what the server still has.
    assert_eq!(texts(store.tasks()), vec!["b", "c"]);
}

#[tokio::test]
async fn due_dates_survive_the_wire() {
    let (url, _records, _handle) = start_store_server().await;
    let mut store = connected_store(&url, "alice").await;

    let date = chrono::NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
    let id = store.add("file taxes", Some(date)).await.unwrap().unwrap();
    assert_eq!(store.tasks()[0].due_date, Some(date));

    store.set_due_date(&id, None).await.unwrap();
    assert_eq!(store.tasks()[0].due_date, None);
}
