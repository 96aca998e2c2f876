use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, error, info};

use crate::{auth::User, error::SubmissionError, session, store::RemoteStore, AppResult};

use super::{view, QuestionForm, RoomState, RoomSynchronizer, SubmitOutcome};

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ClientMessage {
    Draft {
        content: String,
    },
    Submit {
        #[serde(default)]
        content: Option<String>,
    },
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ServerMessage {
    Room {
        title: Option<String>,
        count: usize,
        html: String,
    },
    Submitted {
        key: String,
    },
    Skipped,
    Error {
        message: String,
    },
}

impl ServerMessage {
    fn room(state: &RoomState) -> Self {
        Self::Room {
            title: state.title.clone(),
            count: state.questions.len(),
            html: view::render_questions(&state.questions),
        }
    }

    fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room_ws(
    Path(room_id): Path<String>,
    State(store): State<Arc<dyn RemoteStore>>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let user = session::current_user(&session).await?;

    Ok(ws.on_upgrade(move |socket| live_room(socket, store, room_id, user)))
}

/// One task per socket: room snapshots and client messages are handled in
/// turn, never concurrently.
async fn live_room(socket: WebSocket, store: Arc<dyn RemoteStore>, room_id: String, user: Option<User>) {
    let (mut sender, mut receiver) = socket.split();

    let mut sync = RoomSynchronizer::new(store.clone());
    if let Err(e) = sync.set_room(&room_id) {
        let _ = send(&mut sender, &ServerMessage::error(e)).await;
        return;
    }
    let mut form = QuestionForm::new();
    info!("live view of room {room_id} opened");

    loop {
        let reply = tokio::select! {
            update = sync.next_update() => match update {
                Some(Ok(state)) => ServerMessage::room(state),
                Some(Err(e)) => {
                    error!("room {room_id} subscription failed: {e}");
                    ServerMessage::error(e)
                }
                None => break,
            },
            incoming = receiver.next() => {
                let Some(Ok(msg)) = incoming else {
                    break;
                };
                let text = match msg {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };
                let Ok(client_msg) = serde_json::from_str::<ClientMessage>(text.as_str()) else {
                    debug!("ignoring malformed message in room {room_id}");
                    continue;
                };

                match client_msg {
                    ClientMessage::Draft { content } => {
                        form.set_draft(content);
                        continue;
                    }
                    ClientMessage::Submit { content } => {
                        if let Some(content) = content {
                            form.set_draft(content);
                        }
                        submission_reply(form.submit(store.as_ref(), user.as_ref(), &room_id).await)
                    }
                }
            }
        };

        if send(&mut sender, &reply).await.is_err() {
            break;
        }
    }

    sync.clear();
    info!("live view of room {room_id} closed");
}

fn submission_reply(result: Result<SubmitOutcome, SubmissionError>) -> ServerMessage {
    match result {
        Ok(SubmitOutcome::Submitted { key }) => ServerMessage::Submitted { key },
        Ok(SubmitOutcome::Skipped) => ServerMessage::Skipped,
        Err(e @ (SubmissionError::Unauthenticated | SubmissionError::InvalidRoom(_))) => ServerMessage::error(e),
        Err(SubmissionError::RemoteUnavailable(e)) => {
            error!("question not stored: {e}");
            ServerMessage::error("the question could not be sent, try again")
        }
    }
}

async fn send(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("unserializable message: {e}");
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}
