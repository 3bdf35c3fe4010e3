use crate::{
    error::AppError,
    models::{Message, NewMessage},
    repository::Repository,
    services::{is_blank, today},
};

pub async fn list_for_topic(repo: &dyn Repository, topic_id: i64) -> Result<Vec<Message>, AppError> {
    Ok(repo.list_messages_for_topic(topic_id).await?)
}

/// Every message on the forum, for the admin panel.
pub async fn list_all(repo: &dyn Repository) -> Result<Vec<Message>, AppError> {
    Ok(repo.list_messages().await?)
}

pub async fn get_by_id(repo: &dyn Repository, id: i64) -> Result<Message, AppError> {
    repo.get_message(id).await?.ok_or(AppError::NotFound)
}

/// create
///
/// The topic must exist before the content is even looked at, so posting to a
/// deleted topic is a 404 whatever the form holds.
pub async fn create(
    repo: &dyn Repository,
    topic_id: i64,
    content: Option<&str>,
    client_ip: String,
) -> Result<Message, AppError> {
    if repo.get_topic(topic_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if is_blank(content) {
        return Err(AppError::Validation("Message cannot be empty!".to_string()));
    }

    let message = NewMessage {
        topic_id,
        content: content.unwrap_or_default().to_string(),
        date: today(),
        ip_address: client_ip,
    };
    let id = repo.create_message(message.clone()).await?;
    tracing::info!(topic_id, message_id = id, "message added");

    Ok(Message {
        id,
        topic_id: message.topic_id,
        content: message.content,
        date: message.date,
        ip_address: message.ip_address,
    })
}

pub async fn delete(repo: &dyn Repository, id: i64) -> Result<(), AppError> {
    if repo.delete_message(id).await? {
        tracing::info!(message_id = id, "message deleted");
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
