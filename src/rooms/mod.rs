pub mod model;
pub mod submit;
pub mod sync;
pub mod view;

mod new;
mod questions;
mod room;
mod ws;

use std::sync::Arc;

use axum::{routing::{get, post}, Router};

pub use model::{Author, Question, QuestionRecord, RoomState};
pub use submit::{QuestionForm, SubmitOutcome};
pub use sync::RoomSynchronizer;

use crate::{error::StoreError, store::RemoteStore, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_room_page).post(new::new_room))
        .route("/{room_id}", get(room::room))
        .route("/{room_id}/questions", post(questions::send_question))
        .route("/{room_id}/ws", get(ws::room_ws))
}

/// `/r/{room_id}` with the id percent-encoded, safe for a `Location` header.
pub(crate) fn room_url(room_id: &str) -> String {
    format!("/r/{}", urlencoding::encode(room_id))
}

/// Current state of a room, read once through a short-lived synchronizer.
pub(crate) async fn load_room(store: Arc<dyn RemoteStore>, room_id: &str) -> Result<RoomState, StoreError> {
    let mut sync = RoomSynchronizer::new(store);
    sync.set_room(room_id)?;
    match sync.next_update().await {
        Some(state) => Ok(state?.clone()),
        None => Err(StoreError::Closed),
    }
}
