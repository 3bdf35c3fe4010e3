use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored when the transport layer cannot tell us who the client is.
pub const UNKNOWN_IP: &str = "Unknown";

/// Upper bound on `Topic::title`, counted in characters.
pub const MAX_TITLE_CHARS: usize = 100;

// --- Stored Records ---

/// Topic
///
/// A forum thread: a title plus the opening post (`content`). Maps to the `topics` table.
/// `date` is the creation day rendered as `DD/MM/YYYY` and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Default)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date: String,
    pub ip_address: String,
}

/// Message
///
/// A follow-up post under exactly one topic. Maps to the `messages` table, whose
/// `topic_id` foreign key cascades on topic deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Default)]
pub struct Message {
    pub id: i64,
    pub topic_id: i64,
    pub content: String,
    pub date: String,
    pub ip_address: String,
}

/// NewTopic
///
/// Insert payload produced by the topic service after validation.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub title: String,
    pub content: String,
    pub date: String,
    pub ip_address: String,
}

/// NewMessage
///
/// Insert payload produced by the message service after validation.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub topic_id: i64,
    pub content: String,
    pub date: String,
    pub ip_address: String,
}

// --- Form and Query Payloads ---

// Every field is optional so a missing field reaches our own validation (400)
// instead of being rejected by the extractor.

/// Body of `POST /create_topic`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateTopicForm {
    pub topic_title: Option<String>,
    pub topic_content: Option<String>,
}

/// Body of `POST /add_message/{topic_id}`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AddMessageForm {
    pub message: Option<String>,
}

/// Body of `POST /admin_login`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminLoginForm {
    pub password_input: Option<String>,
}

/// Query string of `/search_topics`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchQuery {
    pub searched_topic: Option<String>,
}
