use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, http::StatusCode, response::{Html, IntoResponse, Response}};
use tower_sessions::Session;

use crate::{error::StoreError, session, store::RemoteStore, AppResult};

use super::{load_room, view::{self, RoomView}};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room(
    State(store): State<Arc<dyn RemoteStore>>,
    session: Session,
    Path(room_id): Path<String>,
) -> AppResult<Response> {
    let user = session::current_user(&session).await?;
    let state = match load_room(store, &room_id).await {
        Ok(state) => state,
        Err(StoreError::InvalidPath(_)) => return Ok((StatusCode::NOT_FOUND, "no such room").into_response()),
        Err(e) => return Err(e.into()),
    };

    let body = view::render(&RoomView {
        room_id: &room_id,
        state: &state,
        draft: "",
        user: user.as_ref(),
        notice: None,
    });

    Ok(Html(body).into_response())
}
