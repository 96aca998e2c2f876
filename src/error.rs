use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid store path '{0}'")]
    InvalidPath(String),

    #[error("store connection closed")]
    Closed,
}

/// Failures of a question submission. An empty draft is not one of them:
/// it is skipped without reaching the store.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("you have to sign in to ask a question")]
    Unauthenticated,

    #[error("no such room '{0}'")]
    InvalidRoom(String),

    #[error("the question could not be sent: {0}")]
    RemoteUnavailable(#[from] StoreError),
}
