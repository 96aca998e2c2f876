use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, Stream, StreamExt};
use letmeask::{
    store::{MemoryStore, RemoteStore},
    AppState,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::{net::TcpListener, time::timeout};
use tokio_tungstenite::tungstenite::Message;
use tower_sessions::{MemoryStore as SessionStore, SessionManagerLayer};

async fn serve(store: Arc<dyn RemoteStore>) -> String {
    let app = letmeask::router()
        .with_state(AppState { store })
        .layer(SessionManagerLayer::new(SessionStore::default()).with_secure(false));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("ws://{addr}")
}

async fn next_json<S>(read: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    timeout(Duration::from_secs(3), async {
        loop {
            if let Message::Text(text) = read.next().await.unwrap().unwrap() {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    })
    .await
    .expect("server should answer")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn live_room_follows_the_store() {
    let store: Arc<dyn RemoteStore> = Arc::new(MemoryStore::with_root(json!({
        "rooms": {"r1": {"title": "Demo"}}
    })));
    let base = serve(store.clone()).await;

    let (ws, _) = tokio_tungstenite::connect_async(format!("{base}/r/r1/ws")).await.expect("ws connect");
    let (_write, mut read) = ws.split();

    let initial = next_json(&mut read).await;
    assert_eq!(initial["type"], json!("room"));
    assert_eq!(initial["title"], json!("Demo"));
    assert_eq!(initial["count"], json!(0));

    store
        .push(
            "rooms/r1/questions",
            json!({"content": "From elsewhere", "author": {"name": "Bo", "avatar": ""}}),
        )
        .await
        .unwrap();

    let update = next_json(&mut read).await;
    assert_eq!(update["count"], json!(1));
    assert!(update["html"].as_str().unwrap().contains("From elsewhere"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn anonymous_submit_is_answered_with_an_error() {
    let store: Arc<dyn RemoteStore> = Arc::new(MemoryStore::with_root(json!({
        "rooms": {"r1": {"title": "Demo"}}
    })));
    let base = serve(store.clone()).await;

    let (ws, _) = tokio_tungstenite::connect_async(format!("{base}/r/r1/ws")).await.expect("ws connect");
    let (mut write, mut read) = ws.split();
    next_json(&mut read).await;

    let submit = json!({"type": "submit", "content": "Anyone there?"}).to_string();
    write.send(Message::Text(submit.into())).await.unwrap();
    let reply = next_json(&mut read).await;
    assert_eq!(reply, json!({"type": "error", "message": "you have to sign in to ask a question"}));

    let blank = json!({"type": "submit", "content": "   "}).to_string();
    write.send(Message::Text(blank.into())).await.unwrap();
    assert_eq!(next_json(&mut read).await, json!({"type": "skipped"}));

    assert_eq!(store.get("rooms/r1/questions").await.unwrap(), Value::Null);
}
