use axum::{debug_handler, extract::Query, response::{Html, IntoResponse, Redirect, Response}};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{include_res, res::escape, rooms, session, AppResult};

#[derive(Deserialize)]
pub(crate) struct JoinQuery {
    #[serde(default)]
    code: String,
}

#[debug_handler]
pub(crate) async fn index(
    session: Session
) -> AppResult<Response> {
    let user_info = match session::current_user(&session).await? {
        Some(user) => format!(r#"Signed in as {} (<a href="/logout">sign out</a>)"#, escape(&user.name)),
        None => r#"<a href="/login">Sign in</a> to ask questions"#.to_owned(),
    };

    Ok(
        Html(
            include_res!(str, "/pages/index.html")
                .replace("{user_info}", &user_info)
        ).into_response()
    )
}

#[debug_handler]
pub(crate) async fn join(
    Query(JoinQuery { code }): Query<JoinQuery>,
) -> Redirect {
    let code = code.trim();
    if code.is_empty() {
        return Redirect::to("/");
    }
    Redirect::to(&rooms::room_url(code))
}
