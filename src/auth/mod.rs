mod login;
mod logout;

use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// The signed-in identity questions are asked under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub avatar: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
}

/// Only same-site paths are followed after sign in or out. They must already
/// be percent-encoded, since they end up in a `Location` header as is.
pub(crate) fn safe_return_url(return_url: Option<String>) -> String {
    match return_url {
        Some(url)
            if url.starts_with('/')
                && !url.starts_with("//")
                && url.bytes().all(|b| b.is_ascii_graphic() && b != b'\\') =>
        {
            url
        }
        _ => "/".to_owned(),
    }
}
