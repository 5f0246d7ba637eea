//! Initial load: success, failure, retries, re-initialization.

use std::time::Duration;

use reactive_store::remote::{InMemoryTransport, Method, TransportError};
use reactive_store::{
    Course, FetchError, RetryPolicy, Store, StoreConfig, StoreError, DEFAULT_ENDPOINT,
};
use serde_json::json;

use crate::support::{course_payload, course_transport, ids, Recorder, COURSES};

fn timeout() -> TransportError {
    TransportError::Timeout {
        url: COURSES.into(),
    }
}

#[tokio::test]
async fn init_fetches_once_and_returns_snapshot() {
    let transport = course_transport();
    let store: Store<Course, _> = Store::new(transport.clone());

    let snapshot = store.init().await.unwrap();

    assert_eq!(ids(&snapshot), vec![1, 2]);
    assert!(snapshot.ptr_eq(&store.current_snapshot()));
    assert_eq!(store.remote().endpoint(), DEFAULT_ENDPOINT);
    assert_eq!(transport.requests()[0].path, COURSES);
    assert_eq!(transport.request_count(Method::Get), 1);
}

#[tokio::test]
async fn failed_load_surfaces_error_and_streams_stay_quiet() {
    let transport = course_transport();
    transport.fail_next_get(timeout());
    let store: Store<Course, _> = Store::new(transport.clone());
    let stream = Recorder::attach(&store.read_stream());

    let err = store.init().await.unwrap_err();

    assert_eq!(err, StoreError::Fetch(FetchError::Transport(timeout())));
    assert_eq!(stream.len(), 1);
    assert!(store.current_snapshot().is_empty());
}

#[tokio::test]
async fn init_can_be_called_again_after_failure() {
    let transport = course_transport();
    transport.fail_next_get(timeout());
    let store: Store<Course, _> = Store::new(transport.clone());

    assert!(store.init().await.is_err());
    let snapshot = store.init().await.unwrap();

    assert_eq!(ids(&snapshot), vec![1, 2]);
    assert_eq!(transport.request_count(Method::Get), 2);
}

#[tokio::test]
async fn reinit_replaces_snapshot_with_fresh_server_state() {
    let transport = course_transport();
    let store: Store<Course, _> = Store::new(transport.clone());
    let stream = Recorder::attach(&store.read_stream());
    store.init().await.unwrap();

    transport.set_collection(
        COURSES,
        json!({ "payload": { "c": { "id": 3, "category": "ADVANCED" } } }),
    );
    store.init().await.unwrap();

    assert_eq!(stream.len(), 3);
    assert_eq!(ids(&stream.last().unwrap()), vec![3]);
}

#[tokio::test]
async fn retry_policy_rebuilds_the_request() {
    let transport = course_transport();
    transport.fail_next_get(timeout());
    transport.fail_next_get(timeout());
    let config =
        StoreConfig::default().with_retry(RetryPolicy::bounded(3, Duration::from_millis(1)));
    let store: Store<Course, _> = Store::with_config(transport.clone(), config);

    let snapshot = store.init().await.unwrap();

    assert_eq!(ids(&snapshot), vec![1, 2]);
    assert_eq!(transport.request_count(Method::Get), 3);
}

#[tokio::test]
async fn retry_policy_gives_up_with_last_error() {
    let transport = course_transport();
    for _ in 0..3 {
        transport.fail_next_get(timeout());
    }
    let config =
        StoreConfig::default().with_retry(RetryPolicy::bounded(2, Duration::from_millis(1)));
    let store: Store<Course, _> = Store::with_config(transport.clone(), config);

    assert!(matches!(store.init().await, Err(StoreError::Fetch(_))));
    assert_eq!(transport.request_count(Method::Get), 2);
}

#[tokio::test]
async fn payload_without_envelope_is_a_decode_error() {
    let transport = InMemoryTransport::new().with_collection(COURSES, json!([{ "id": 1 }]));
    let store: Store<Course, _> = Store::new(transport);

    let err = store.init().await.unwrap_err();

    assert!(matches!(err, StoreError::Fetch(FetchError::Decode { .. })));
    assert!(store.current_snapshot().is_empty());
}

#[tokio::test]
async fn empty_payload_loads_empty_snapshot() {
    let transport =
        InMemoryTransport::new().with_collection(COURSES, json!({ "payload": {} }));
    let store: Store<Course, _> = Store::new(transport);
    let beginners = Recorder::attach(&store.select_beginner_courses());

    let snapshot = store.init().await.unwrap();

    assert!(snapshot.is_empty());
    assert_eq!(beginners.len(), 2);
    assert!(beginners.last().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_ids_keep_first_occurrence() {
    let mut payload = course_payload();
    payload["payload"]["c"] = json!({
        "id": 1,
        "description": "Shadow copy",
        "category": "ADVANCED"
    });
    let store: Store<Course, _> =
        Store::new(InMemoryTransport::new().with_collection(COURSES, payload));

    let snapshot = store.init().await.unwrap();

    assert_eq!(ids(&snapshot), vec![1, 2]);
    assert_eq!(snapshot[0].description, "Angular Core Deep Dive");
}

#[tokio::test]
async fn shared_transport_serves_independent_stores() {
    let transport = std::sync::Arc::new(course_transport());
    let first: Store<Course, _> = Store::from_shared(transport.clone(), StoreConfig::default());
    let second: Store<Course, _> = Store::from_shared(transport.clone(), StoreConfig::default());

    first.init().await.unwrap();

    assert_eq!(first.current_snapshot().len(), 2);
    assert!(second.current_snapshot().is_empty());
    assert_eq!(transport.request_count(Method::Get), 1);
}
