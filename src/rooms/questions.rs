use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::error;

use crate::{error::SubmissionError, session, store::RemoteStore, AppResult};

use super::{load_room, room_url, view::{self, Notice, RoomView}, QuestionForm, RoomState};

#[derive(Deserialize)]
pub(crate) struct SendQuestionForm {
    #[serde(default)]
    content: String,
}

/// Plain form post, for pages without a live socket.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn send_question(
    State(store): State<Arc<dyn RemoteStore>>,
    session: Session,
    Path(room_id): Path<String>,
    Form(SendQuestionForm { content }): Form<SendQuestionForm>,
) -> AppResult<Response> {
    let user = session::current_user(&session).await?;
    let mut form = QuestionForm::with_draft(content);

    let (status, notice) = match form.submit(store.as_ref(), user.as_ref(), &room_id).await {
        Ok(_) => return Ok(Redirect::to(&room_url(&room_id)).into_response()),
        Err(SubmissionError::InvalidRoom(_)) => return Ok((StatusCode::NOT_FOUND, "no such room").into_response()),
        Err(SubmissionError::Unauthenticated) => (StatusCode::UNAUTHORIZED, Notice::SignInRequired),
        Err(SubmissionError::RemoteUnavailable(e)) => {
            error!("question for room {room_id} not stored: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, Notice::SendFailed)
        }
    };

    // the store may be the thing that failed, so an unreadable room still renders
    let state = load_room(store, &room_id).await.unwrap_or_else(|e| {
        error!("room {room_id} unreadable: {e}");
        RoomState::default()
    });

    let body = view::render(&RoomView {
        room_id: &room_id,
        state: &state,
        draft: form.draft(),
        user: user.as_ref(),
        notice: Some(notice),
    });
    Ok((status, Html(body)).into_response())
}
