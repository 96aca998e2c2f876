use std::{sync::Arc, time::Duration};

use letmeask::{
    auth::User,
    error::SubmissionError,
    rooms::{QuestionForm, RoomSynchronizer, SubmitOutcome},
    store::{MemoryStore, RemoteStore, SqliteStore},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::timeout;

fn ann() -> User {
    User {
        name: "Ann".to_owned(),
        avatar: "https://example.com/ann.png".to_owned(),
    }
}

async fn ask_and_observe(store: Arc<dyn RemoteStore>) {
    store.set("rooms/r1", json!({"title": "Demo"})).await.unwrap();

    let mut sync = RoomSynchronizer::new(store.clone());
    sync.set_room("r1").unwrap();
    let initial = sync.next_update().await.unwrap().unwrap();
    assert_eq!(initial.title.as_deref(), Some("Demo"));
    assert!(initial.questions.is_empty());

    let mut form = QuestionForm::new();
    let mut keys = Vec::new();
    for text in ["First?", "Second?", "Third?"] {
        form.set_draft(text);
        match form.submit(store.as_ref(), Some(&ann()), "r1").await.unwrap() {
            SubmitOutcome::Submitted { key } => keys.push(key),
            SubmitOutcome::Skipped => panic!("non-empty draft was skipped"),
        }
        assert_eq!(form.draft(), "");
    }

    // snapshots may coalesce; wait until all three questions are mirrored
    let questions = timeout(Duration::from_secs(2), async {
        loop {
            let state = sync.next_update().await.unwrap().unwrap();
            if state.questions.len() == 3 {
                return state.questions.clone();
            }
        }
    })
    .await
    .expect("all questions should reach the mirror");

    let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
    assert_eq!(ids, keys);
    let contents: Vec<&str> = questions.iter().map(|q| q.content.as_str()).collect();
    assert_eq!(contents, ["First?", "Second?", "Third?"]);
    assert!(questions.iter().all(|q| !q.is_answered && !q.is_highlighted && q.author.name == "Ann"));
}

#[tokio::test]
async fn questions_round_trip_through_memory_store() {
    ask_and_observe(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn questions_round_trip_through_sqlite_store() {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    ask_and_observe(Arc::new(store)).await;
}

#[tokio::test]
async fn room_with_n_questions_mirrors_n_entries() {
    let questions: serde_json::Map<String, serde_json::Value> = (0..25)
        .map(|i| (format!("key{i:02}"), json!({"content": format!("q{i}")})))
        .collect();
    let store: Arc<dyn RemoteStore> = Arc::new(MemoryStore::with_root(json!({
        "rooms": {"big": {"title": "Big", "questions": questions}}
    })));

    let mut sync = RoomSynchronizer::new(store);
    sync.set_room("big").unwrap();
    let state = sync.next_update().await.unwrap().unwrap();

    assert_eq!(state.questions.len(), 25);
    for (i, question) in state.questions.iter().enumerate() {
        assert_eq!(question.id, format!("key{i:02}"));
    }
}

#[tokio::test]
async fn rejected_submissions_leave_the_room_untouched() {
    let store: Arc<dyn RemoteStore> = Arc::new(MemoryStore::with_root(json!({
        "rooms": {"r1": {"title": "Quiet"}}
    })));
    let mut changes = store.changes();

    let mut blank = QuestionForm::with_draft("   ");
    assert_eq!(blank.submit(store.as_ref(), Some(&ann()), "r1").await.unwrap(), SubmitOutcome::Skipped);

    let mut anonymous = QuestionForm::with_draft("Who am I?");
    assert!(matches!(
        anonymous.submit(store.as_ref(), None, "r1").await,
        Err(SubmissionError::Unauthenticated)
    ));

    assert!(changes.try_recv().is_err(), "nothing should have been written");
    assert_eq!(store.get("rooms/r1").await.unwrap(), json!({"title": "Quiet"}));
}

#[tokio::test]
async fn switching_rooms_does_not_leak_the_previous_room() {
    let store: Arc<dyn RemoteStore> = Arc::new(MemoryStore::with_root(json!({
        "rooms": {"A": {"title": "Room A"}, "B": {"title": "Room B"}}
    })));
    let mut sync = RoomSynchronizer::new(store.clone());

    sync.set_room("B").unwrap();
    sync.next_update().await.unwrap().unwrap();
    sync.set_room("A").unwrap();

    let mut form = QuestionForm::with_draft("meant for B");
    form.submit(store.as_ref(), Some(&ann()), "B").await.unwrap();

    let state = sync.next_update().await.unwrap().unwrap();
    assert_eq!(state.title.as_deref(), Some("Room A"));
    assert!(state.questions.is_empty());

    form.set_draft("for A");
    form.submit(store.as_ref(), Some(&ann()), "A").await.unwrap();
    let state = sync.next_update().await.unwrap().unwrap();
    assert_eq!(state.title.as_deref(), Some("Room A"));
    assert_eq!(state.questions.len(), 1);
    assert_eq!(state.questions[0].content, "for A");
}
