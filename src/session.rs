use tower_sessions::Session;

use crate::{auth::User, AppResult};

pub const CURRENT_USER: &str = "current_user";

pub async fn current_user(session: &Session) -> AppResult<Option<User>> {
    Ok(session.get::<User>(CURRENT_USER).await?)
}
