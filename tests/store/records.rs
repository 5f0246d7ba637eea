//! A store over a record type declared outside the crate.

use reactive_store::remote::{InMemoryTransport, Method};
use reactive_store::{Record, Store, StoreConfig};
use serde_json::json;

use crate::support::{ids, Lesson, LessonKind, LessonPatch, Recorder};

const LESSONS: &str = "/api/lessons";

fn lesson_transport() -> InMemoryTransport {
    InMemoryTransport::new().with_collection(
        LESSONS,
        json!({
            "payload": {
                "10": { "seqNo": 10, "kind": "video", "title": "Intro", "duration": "4:17" },
                "11": { "seqNo": 11, "kind": "exercise", "title": "Setup", "duration": "2:05" },
                "12": { "seqNo": 12, "kind": "video", "title": "Pipes", "duration": "7:40" }
            }
        }),
    )
}

fn lesson_store() -> (Store<Lesson, InMemoryTransport>, InMemoryTransport) {
    let transport = lesson_transport();
    let store = Store::with_config(transport.clone(), StoreConfig::new(LESSONS));
    (store, transport)
}

#[test]
fn derived_patch_merges_present_fields() {
    let lesson = Lesson {
        seq_no: 3,
        kind: LessonKind::Video,
        title: "Intro".into(),
        duration_text: "4:17".into(),
    };

    let patched = lesson.apply(&LessonPatch {
        kind: Some(LessonKind::Exercise),
        ..Default::default()
    });

    assert_eq!(patched.id(), 3);
    assert_eq!(*patched.category(), LessonKind::Exercise);
    assert_eq!(patched.title, "Intro");
    assert_eq!(patched.duration_text, "4:17");
    assert!(LessonPatch::default().is_empty());
}

#[test]
fn derived_patch_follows_serde_renames() {
    let patch = LessonPatch {
        kind: Some(LessonKind::Exercise),
        duration_text: Some("1:00".into()),
        ..Default::default()
    };

    assert_eq!(
        serde_json::to_value(&patch).unwrap(),
        json!({ "kind": "exercise", "duration": "1:00" })
    );
}

#[tokio::test]
async fn lessons_load_in_payload_order() {
    let (store, _) = lesson_store();
    let snapshot = store.init().await.unwrap();

    assert_eq!(ids(&snapshot), vec![10, 11, 12]);
    assert_eq!(snapshot[0].duration_text, "4:17");
}

#[tokio::test]
async fn lessons_filter_by_their_own_tag() {
    let (store, _) = lesson_store();
    let videos = Recorder::attach(&store.filter_by_category(LessonKind::Video));
    store.init().await.unwrap();

    assert_eq!(ids(&videos.last().unwrap()), vec![10, 12]);

    store
        .save_record(
            11,
            LessonPatch {
                kind: Some(LessonKind::Video),
                ..Default::default()
            },
        )
        .unwrap()
        .await
        .unwrap();

    assert_eq!(ids(&videos.last().unwrap()), vec![10, 11, 12]);
}

#[tokio::test]
async fn lesson_writes_target_the_configured_endpoint() {
    let (store, transport) = lesson_store();
    store.init().await.unwrap();

    store
        .save_record(
            12,
            LessonPatch {
                title: Some("Async Pipes".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .await
        .unwrap();

    let put = transport
        .requests()
        .into_iter()
        .find(|r| r.method == Method::Put)
        .unwrap();
    assert_eq!(put.path, "/api/lessons/12");
    assert_eq!(put.body, Some(json!({ "title": "Async Pipes" })));
}
