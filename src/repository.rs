use crate::models::{Message, NewMessage, NewTopic, Topic};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Repository Trait
///
/// The persistence contract used by the services. Handlers never see SQL; tests can
/// swap in a mock to exercise store failures.
///
/// **Send + Sync + async_trait** are required so `Arc<dyn Repository>` can live in
/// the shared application state.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Topics ---
    // All topics in insertion order.
    async fn list_topics(&self) -> Result<Vec<Topic>, sqlx::Error>;
    // Case-insensitive title substring match, insertion order.
    async fn search_topics(&self, needle: &str) -> Result<Vec<Topic>, sqlx::Error>;
    async fn get_topic(&self, id: i64) -> Result<Option<Topic>, sqlx::Error>;
    // Returns the generated id.
    async fn create_topic(&self, topic: NewTopic) -> Result<i64, sqlx::Error>;
    // Removes the topic and its messages. `false` if no such topic.
    async fn delete_topic(&self, id: i64) -> Result<bool, sqlx::Error>;

    // --- Messages ---
    async fn list_messages(&self) -> Result<Vec<Message>, sqlx::Error>;
    async fn list_messages_for_topic(&self, topic_id: i64) -> Result<Vec<Message>, sqlx::Error>;
    async fn get_message(&self, id: i64) -> Result<Option<Message>, sqlx::Error>;
    async fn create_message(&self, message: NewMessage) -> Result<i64, sqlx::Error>;
    // `false` if no such message.
    async fn delete_message(&self, id: i64) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS topics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title VARCHAR(100) NOT NULL,
        content TEXT NOT NULL,
        date VARCHAR(20) NOT NULL,
        ip_address VARCHAR(50) NOT NULL DEFAULT 'Unknown'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        date VARCHAR(20) NOT NULL,
        ip_address VARCHAR(50) NOT NULL DEFAULT 'Unknown'
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_topic_id ON messages(topic_id)",
];

/// SqliteRepository
///
/// The concrete implementation of the `Repository` trait, backed by SQLite.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// init_schema
    ///
    /// Creates both tables if they are absent. Safe to run on every startup.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Escapes LIKE wildcards so the search needle is matched literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn list_topics(&self) -> Result<Vec<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            "SELECT id, title, content, date, ip_address FROM topics ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// search_topics
    ///
    /// Case-insensitive for ASCII letters only; SQLite's `lower()` leaves other
    /// scripts untouched.
    async fn search_topics(&self, needle: &str) -> Result<Vec<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"SELECT id, title, content, date, ip_address
               FROM topics
               WHERE lower(title) LIKE lower(?) ESCAPE '\'
               ORDER BY id ASC"#,
        )
        .bind(like_pattern(needle))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_topic(&self, id: i64) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            "SELECT id, title, content, date, ip_address FROM topics WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_topic(&self, topic: NewTopic) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO topics (title, content, date, ip_address) VALUES (?, ?, ?, ?)",
        )
        .bind(topic.title)
        .bind(topic.content)
        .bind(topic.date)
        .bind(topic.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// delete_topic
    ///
    /// Deletes the children explicitly inside the same transaction, so the cascade
    /// holds even on a connection opened without `PRAGMA foreign_keys`.
    async fn delete_topic(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM messages WHERE topic_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_messages(&self) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            "SELECT id, topic_id, content, date, ip_address FROM messages ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_messages_for_topic(&self, topic_id: i64) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"SELECT id, topic_id, content, date, ip_address
               FROM messages WHERE topic_id = ? ORDER BY id ASC"#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_message(&self, id: i64) -> Result<Option<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            "SELECT id, topic_id, content, date, ip_address FROM messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_message(&self, message: NewMessage) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO messages (topic_id, content, date, ip_address) VALUES (?, ?, ?, ?)",
        )
        .bind(message.topic_id)
        .bind(message.content)
        .bind(message.date)
        .bind(message.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn delete_message(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
