//! Property-based wire protocol tests.
//!
//! Uses proptest to verify:
//! 1. Any valid `GatewayRequest` survives encode → decode round-trip.
//! 2. Any valid `GatewayResponse` survives encode → decode round-trip.
//! 3. Arbitrary text never causes a panic in decode (returns `Err` or a
//!    valid value, never aborts).

use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

use taskdeck_proto::codec;
use taskdeck_proto::gateway::{
    BatchOp, GatewayRequest, GatewayResponse, RequestOp, ResponseBody,
};
use taskdeck_proto::task::{DueDatePatch, Task, TaskDraft, TaskId, TaskPatch, UserId};

// --- Strategies for record types ---

/// Strategy for generating arbitrary `TaskId` values.
fn arb_task_id() -> impl Strategy<Value = TaskId> {
    any::<u128>().prop_map(|n| TaskId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating arbitrary `UserId` values.
fn arb_user_id() -> impl Strategy<Value = UserId> {
    "[a-zA-Z0-9_-]{1,32}".prop_map(UserId::new)
}

/// Strategy for generating arbitrary calendar dates.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).expect("day <= 28 is valid in every month")
    })
}

/// Strategy for generating task text (control characters excluded, as the
/// validation layer would reject them upstream anyway).
fn arb_text() -> impl Strategy<Value = String> {
    "[^\x00-\x1f]{0,256}"
}

/// Strategy for generating arbitrary `Task` values.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_task_id(),
        arb_user_id(),
        arb_text(),
        any::<bool>(),
        any::<i64>(),
        prop::option::of(arb_date()),
    )
        .prop_map(|(id, user_id, text, is_completed, order, due_date)| Task {
            id,
            user_id,
            text,
            is_completed,
            order,
            due_date,
        })
}

/// Strategy for generating arbitrary `TaskDraft` values.
fn arb_draft() -> impl Strategy<Value = TaskDraft> {
    (
        arb_user_id(),
        arb_text(),
        any::<bool>(),
        any::<i64>(),
        prop::option::of(arb_date()),
    )
        .prop_map(|(user_id, text, is_completed, order, due_date)| TaskDraft {
            user_id,
            text,
            is_completed,
            order,
            due_date,
        })
}

/// Strategy for generating arbitrary `DueDatePatch` values.
fn arb_due_patch() -> impl Strategy<Value = DueDatePatch> {
    prop_oneof![
        arb_date().prop_map(DueDatePatch::Set),
        Just(DueDatePatch::Clear),
    ]
}

/// Strategy for generating arbitrary `TaskPatch` values.
fn arb_patch() -> impl Strategy<Value = TaskPatch> {
    (
        prop::option::of(arb_text()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<i64>()),
        prop::option::of(arb_due_patch()),
    )
        .prop_map(|(text, is_completed, order, due_date)| TaskPatch {
            text,
            is_completed,
            order,
            due_date,
        })
}

/// Strategy for generating arbitrary `BatchOp` values.
fn arb_batch_op() -> impl Strategy<Value = BatchOp> {
    prop_oneof![
        (arb_task_id(), arb_patch()).prop_map(|(id, patch)| BatchOp::Update { id, patch }),
        arb_task_id().prop_map(|id| BatchOp::Delete { id }),
    ]
}

// --- Strategies for protocol frames ---

/// Strategy for generating arbitrary `RequestOp` values.
fn arb_request_op() -> impl Strategy<Value = RequestOp> {
    prop_oneof![
        arb_user_id().prop_map(|user_id| RequestOp::Query { user_id }),
        arb_draft().prop_map(|draft| RequestOp::Insert { draft }),
        (arb_task_id(), arb_patch()).prop_map(|(id, patch)| RequestOp::Patch { id, patch }),
        arb_task_id().prop_map(|id| RequestOp::Delete { id }),
        prop::collection::vec(arb_batch_op(), 0..8).prop_map(|ops| RequestOp::Batch { ops }),
    ]
}

/// Strategy for generating arbitrary `GatewayRequest` values.
fn arb_request() -> impl Strategy<Value = GatewayRequest> {
    (any::<u64>(), arb_request_op())
        .prop_map(|(request_id, op)| GatewayRequest { request_id, op })
}

/// Strategy for generating arbitrary `ResponseBody` values.
fn arb_response_body() -> impl Strategy<Value = ResponseBody> {
    prop_oneof![
        prop::collection::vec(arb_task(), 0..8).prop_map(ResponseBody::Records),
        arb_task_id().prop_map(ResponseBody::Inserted),
        Just(ResponseBody::Ack),
        arb_text().prop_map(ResponseBody::Error),
    ]
}

/// Strategy for generating arbitrary `GatewayResponse` values.
fn arb_response() -> impl Strategy<Value = GatewayResponse> {
    (any::<u64>(), arb_response_body())
        .prop_map(|(request_id, body)| GatewayResponse { request_id, body })
}

// --- Property tests ---

proptest! {
    /// Any valid request survives an encode → decode round-trip.
    #[test]
    fn request_round_trip(request in arb_request()) {
        let frame = codec::encode_request(&request).expect("encode should succeed");
        let decoded = codec::decode_request(&frame).expect("decode should succeed");
        prop_assert_eq!(decoded, request);
    }

    /// Any valid response survives an encode → decode round-trip.
    #[test]
    fn response_round_trip(response in arb_response()) {
        let frame = codec::encode_response(&response).expect("encode should succeed");
        let decoded = codec::decode_response(&frame).expect("decode should succeed");
        prop_assert_eq!(decoded, response);
    }

    /// Arbitrary text never panics the request decoder.
    #[test]
    fn garbage_never_panics_request_decode(text in ".*") {
        let _ = codec::decode_request(&text);
    }

    /// Arbitrary text never panics the response decoder.
    #[test]
    fn garbage_never_panics_response_decode(text in ".*") {
        let _ = codec::decode_response(&text);
    }

    /// A request frame never decodes as a response with a different id.
    #[test]
    fn request_id_is_preserved(request in arb_request()) {
        let frame = codec::encode_request(&request).expect("encode should succeed");
        let decoded = codec::decode_request(&frame).expect("decode should succeed");
        prop_assert_eq!(decoded.request_id, request.request_id);
    }
}
