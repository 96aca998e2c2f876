use tracing::{info, warn};

use super::{
    model::{Author, QuestionRecord},
    sync::{check_room_id, questions_path},
};
use crate::{
    auth::User,
    error::{StoreError, SubmissionError},
    store::RemoteStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank draft, nothing was sent.
    Skipped,
    Submitted { key: String },
}

/// The question being typed for one room, and the act of sending it.
#[derive(Debug, Clone, Default)]
pub struct QuestionForm {
    draft: String,
}

impl QuestionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: impl Into<String>) -> Self {
        Self { draft: draft.into() }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Appends the draft to the room's questions as `user`.
    ///
    /// The draft is cleared only once the store has accepted the write; it
    /// does not wait for the room subscription to show the new question.
    pub async fn submit(
        &mut self,
        store: &dyn RemoteStore,
        user: Option<&User>,
        room_id: &str,
    ) -> Result<SubmitOutcome, SubmissionError> {
        if self.draft.trim().is_empty() {
            return Ok(SubmitOutcome::Skipped);
        }

        let Some(user) = user else {
            warn!("anonymous question attempt in room {room_id}");
            return Err(SubmissionError::Unauthenticated);
        };
        if check_room_id(room_id).is_err() {
            return Err(SubmissionError::InvalidRoom(room_id.to_owned()));
        }

        let record = QuestionRecord::new(self.draft.clone(), Author::from(user));
        let value = serde_json::to_value(&record).map_err(StoreError::from)?;
        let key = store.push(&questions_path(room_id), value).await?;

        info!("{} asked {key} in room {room_id}", user.name);
        self.draft.clear();
        Ok(SubmitOutcome::Submitted { key })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tokio::sync::broadcast;

    use super::*;
    use crate::store::Snapshot;

    /// Records pushes; fails them when `fail` is set.
    #[derive(Default)]
    struct RecordingStore {
        pushes: Mutex<Vec<(String, Value)>>,
        fail: bool,
    }

    #[async_trait]
    impl RemoteStore for RecordingStore {
        async fn get(&self, _path: &str) -> Result<Snapshot, StoreError> {
            Ok(Value::Null)
        }

        async fn set(&self, _path: &str, _value: Value) -> Result<(), StoreError> {
            Ok(())
        }

        async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
            if self.fail {
                return Err(StoreError::Closed);
            }
            let mut pushes = self.pushes.lock().unwrap();
            pushes.push((path.to_owned(), value));
            Ok(format!("key{}", pushes.len()))
        }

        fn changes(&self) -> broadcast::Receiver<String> {
            broadcast::channel(1).1
        }
    }

    fn ann() -> User {
        User {
            name: "Ann".to_owned(),
            avatar: "https://example.com/ann.png".to_owned(),
        }
    }

    #[tokio::test]
    async fn blank_drafts_are_skipped() {
        let store = RecordingStore::default();
        for draft in ["", "   ", "\n\t"] {
            let mut form = QuestionForm::with_draft(draft);
            let outcome = form.submit(&store, Some(&ann()), "r1").await.unwrap();
            assert_eq!(outcome, SubmitOutcome::Skipped);
            assert_eq!(form.draft(), draft);
        }
        assert!(store.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_submission_never_reaches_the_store() {
        let store = RecordingStore::default();
        let mut form = QuestionForm::with_draft("Is this on?");

        let result = form.submit(&store, None, "r1").await;
        assert!(matches!(result, Err(SubmissionError::Unauthenticated)));
        assert_eq!(form.draft(), "Is this on?");
        assert!(store.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signed_in_submission_appends_once_and_clears_draft() {
        let store = RecordingStore::default();
        let mut form = QuestionForm::new();
        form.set_draft("  How does it sync?  ");

        let outcome = form.submit(&store, Some(&ann()), "r1").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Submitted { key: "key1".to_owned() });
        assert_eq!(form.draft(), "");

        let pushes = store.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].0, "rooms/r1/questions");
        assert_eq!(
            pushes[0].1,
            json!({
                "content": "  How does it sync?  ",
                "author": {"name": "Ann", "avatar": "https://example.com/ann.png"},
                "isAnswered": false,
                "isHighLighted": false
            })
        );
    }

    #[tokio::test]
    async fn malformed_room_id_is_refused_locally() {
        let store = RecordingStore::default();
        for room_id in ["a.b", "a/questions", "$x"] {
            let mut form = QuestionForm::with_draft("Where am I?");
            let result = form.submit(&store, Some(&ann()), room_id).await;
            assert!(matches!(result, Err(SubmissionError::InvalidRoom(ref id)) if id == room_id), "{room_id}");
            assert_eq!(form.draft(), "Where am I?");
        }
        assert!(store.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_keeps_the_draft_for_retry() {
        let store = RecordingStore {
            fail: true,
            ..Default::default()
        };
        let mut form = QuestionForm::with_draft("Anyone?");

        let result = form.submit(&store, Some(&ann()), "r1").await;
        assert!(matches!(result, Err(SubmissionError::RemoteUnavailable(StoreError::Closed))));
        assert_eq!(form.draft(), "Anyone?");
    }
}
