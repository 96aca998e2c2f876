use axum::{debug_handler, extract::Query, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{include_res, res::escape, session::CURRENT_USER, AppResult};

use super::{safe_return_url, User};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    name: String,
    #[serde(default)]
    avatar: String,
    return_url: Option<String>,
}

fn login_html(return_url: &str, notice: &str) -> Html<String> {
    Html(
        include_res!(str, "/pages/auth/login.html")
            .replace("{notice}", notice)
            .replace("{return_url}", &escape(return_url))
    )
}

#[debug_handler]
pub(crate) async fn login_page(
    Query(LoginQuery { return_url }): Query<LoginQuery>,
) -> impl IntoResponse {
    login_html(&safe_return_url(return_url), "")
}

#[debug_handler]
pub(crate) async fn login(
    session: Session,
    Form(LoginForm { name, avatar, return_url }): Form<LoginForm>,
) -> AppResult<Response> {
    let return_url = safe_return_url(return_url);

    let name = name.trim();
    if name.is_empty() {
        return Ok(login_html(&return_url, r#"<p class="notice" role="alert">Pick a name to sign in.</p>"#).into_response());
    }

    let user = User {
        name: name.to_owned(),
        avatar: avatar.trim().to_owned(),
    };
    session.cycle_id().await?;
    session.insert(CURRENT_USER, &user).await?;

    info!("welcome {}", user.name);
    Ok(Redirect::to(&return_url).into_response())
}
