pub mod auth;
pub mod config;
pub mod error;
pub mod res;
pub mod rooms;
pub mod session;
pub mod store;

mod index;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}, routing::get, Router};

use crate::{error::StoreError, store::RemoteStore};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
}

/// Every route of the app. Session and trace layers are added by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .route("/join", get(index::join))
        .route("/res/logo.svg", get(res::logo))

        .merge(auth::router())
        .nest("/r", rooms::router())
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(StoreError);
apperr_impl!(tower_sessions::session::Error);
