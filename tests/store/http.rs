//! HTTP transport integration tests.
//!
//! Starts an axum server holding the course collection and drives a store against it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use reactive_store::remote::{HttpTransport, TransportError};
use reactive_store::{
    Category, Course, CourseChanges, FetchError, HttpTransportConfig, PersistenceError, Store,
    StoreConfig, StoreError, WriteState,
};
use serde_json::{json, Value};

use crate::support::{course_payload, ids, Recorder};

#[derive(Default)]
struct Server {
    payload: Value,
    puts: Vec<(u64, Option<String>, Value)>,
    reject_puts: bool,
}

type Shared = Arc<Mutex<Server>>;

async fn list_courses(State(server): State<Shared>) -> Json<Value> {
    Json(server.lock().unwrap().payload.clone())
}

async fn save_course(
    State(server): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut server = server.lock().unwrap();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    server.puts.push((id, content_type, body));
    if server.reject_puts {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn slow_courses() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!({ "payload": {} }))
}

/// Bind to port 0 and return the base url plus the server state.
async fn start_server() -> (String, Shared) {
    let server = Arc::new(Mutex::new(Server {
        payload: course_payload(),
        ..Default::default()
    }));
    let app = Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:id", put(save_course))
        .route("/api/slow", get(slow_courses))
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), server)
}

#[tokio::test]
async fn init_over_http() {
    let (base, _) = start_server().await;
    let store: Store<Course, _> = Store::new(HttpTransport::new(base).unwrap());

    let snapshot = store.init().await.unwrap();

    assert_eq!(ids(&snapshot), vec![1, 2]);
    assert_eq!(snapshot[1].description, "RxJs In Practice");
    assert_eq!(snapshot[1].lessons_count, 18);
}

#[tokio::test]
async fn save_puts_json_changes_to_record_url() {
    let (base, server) = start_server().await;
    let store: Store<Course, _> = Store::new(HttpTransport::new(base).unwrap());
    store.init().await.unwrap();
    let beginners = Recorder::attach(&store.select_beginner_courses());

    let write = store
        .save_record(
            2,
            CourseChanges {
                category: Some(Category::Beginner),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(ids(&beginners.last().unwrap()), vec![1, 2]);
    write.await.unwrap();

    let server = server.lock().unwrap();
    assert_eq!(server.puts.len(), 1);
    let (id, content_type, body) = &server.puts[0];
    assert_eq!(*id, 2);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, &json!({ "category": "BEGINNER" }));
}

#[tokio::test]
async fn rejected_put_reports_status_and_keeps_local_change() {
    let (base, server) = start_server().await;
    server.lock().unwrap().reject_puts = true;
    let store: Store<Course, _> = Store::new(HttpTransport::new(base).unwrap());
    store.init().await.unwrap();

    let write = store
        .save_record(
            1,
            CourseChanges {
                lessons_count: Some(12),
                ..Default::default()
            },
        )
        .unwrap();
    let mut state = write.watch_state();
    let err = write.await.unwrap_err();

    assert!(matches!(
        err,
        PersistenceError::Transport(TransportError::Status { status: 500, .. })
    ));
    assert_eq!(*state.borrow_and_update(), WriteState::RemoteFailed);
    assert_eq!(store.current_snapshot()[0].lessons_count, 12);
}

#[tokio::test]
async fn missing_collection_is_a_status_error() {
    let (base, _) = start_server().await;
    let store: Store<Course, _> = Store::with_config(
        HttpTransport::new(base).unwrap(),
        StoreConfig::new("/api/missing"),
    );

    let err = store.init().await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Fetch(FetchError::Transport(TransportError::Status { status: 404, .. }))
    ));
}

#[tokio::test]
async fn slow_server_times_out() {
    let (base, _) = start_server().await;
    let config = HttpTransportConfig::new(base).with_timeout(Duration::from_millis(50));
    let store: Store<Course, _> = Store::with_config(
        HttpTransport::from_config(&config).unwrap(),
        StoreConfig::new("/api/slow"),
    );

    let err = store.init().await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Fetch(FetchError::Transport(TransportError::Timeout { .. }))
    ));
    assert!(store.current_snapshot().is_empty());
}
