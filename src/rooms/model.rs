use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::auth::User;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// A question as stored under `rooms/{id}/questions/{key}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default, rename = "isHighLighted")]
    pub is_highlighted: bool,
}

impl QuestionRecord {
    pub fn new(content: String, author: Author) -> Self {
        Self {
            content,
            author,
            is_answered: false,
            is_highlighted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub is_answered: bool,
    #[serde(rename = "isHighLighted")]
    pub is_highlighted: bool,
}

impl Question {
    fn from_record(id: String, record: QuestionRecord) -> Self {
        Self {
            id,
            content: record.content,
            author: record.author,
            is_answered: record.is_answered,
            is_highlighted: record.is_highlighted,
        }
    }
}

/// Local mirror of one room: its title and questions in store key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomState {
    pub title: Option<String>,
    pub questions: Vec<Question>,
}

impl RoomState {
    /// Decodes a `rooms/{id}` snapshot. A missing room or a room without
    /// questions gives an empty list; a malformed question keeps its slot
    /// with default fields.
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let title = snapshot
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let questions = match snapshot.get("questions") {
            None | Some(Value::Null) => Vec::new(),
            // push keys sort chronologically, so key order is creation order
            Some(Value::Object(entries)) => entries
                .iter()
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .map(|(key, raw)| {
                    let record = QuestionRecord::deserialize(raw).unwrap_or_else(|e| {
                        warn!("question {key} is malformed: {e}");
                        QuestionRecord::default()
                    });
                    Question::from_record(key.clone(), record)
                })
                .collect(),
            Some(other) => {
                warn!("questions is not a mapping: {other}");
                Vec::new()
            }
        };

        Self { title, questions }
    }
}
