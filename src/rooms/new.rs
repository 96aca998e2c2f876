use std::sync::Arc;

use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::info;

use crate::{include_res, session, store::RemoteStore, AppResult};

use super::room_url;

#[derive(Debug, Deserialize)]
pub(crate) struct NewRoomForm {
    #[serde(default)]
    title: String,
}

fn new_room_html(notice: &str) -> Html<String> {
    Html(include_res!(str, "/pages/rooms/new_room.html").replace("{notice}", notice))
}

#[debug_handler]
pub(crate) async fn new_room_page(
    session: Session,
) -> AppResult<Response> {
    if session::current_user(&session).await?.is_none() {
        return Ok(Redirect::to("/login?return_url=/r/new").into_response());
    }

    Ok(new_room_html("").into_response())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_room(
    State(store): State<Arc<dyn RemoteStore>>,
    session: Session,

    Form(NewRoomForm { title }): Form<NewRoomForm>,
) -> AppResult<Response> {
    let Some(user) = session::current_user(&session).await? else {
        return Ok(Redirect::to("/login?return_url=/r/new").into_response());
    };

    let title = title.trim();
    if title.is_empty() {
        return Ok(new_room_html(r#"<p class="notice" role="alert">Give the room a title.</p>"#).into_response());
    }

    let room_id = store.push("rooms", json!({ "title": title })).await?;
    info!("{} opened room {room_id} ({title})", user.name);

    Ok(Redirect::to(&room_url(&room_id)).into_response())
}
