use crate::{
    error::AppError,
    models::{MAX_TITLE_CHARS, NewTopic, Topic},
    repository::Repository,
    services::{is_blank, today},
};

/// SearchOutcome
///
/// The three results `/search_topics` can render. `NoResults` is a normal outcome,
/// distinct from `All(vec![])` on an empty forum.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// No query was given; every topic, insertion order.
    All(Vec<Topic>),
    /// At least one title matched, insertion order.
    Matches(Vec<Topic>),
    NoResults,
}

pub async fn list_all(repo: &dyn Repository) -> Result<Vec<Topic>, AppError> {
    Ok(repo.list_topics().await?)
}

/// search
///
/// Case-insensitive substring match on the title. A missing or blank query lists
/// every topic.
pub async fn search(repo: &dyn Repository, query: Option<&str>) -> Result<SearchOutcome, AppError> {
    let Some(needle) = query.filter(|q| !q.trim().is_empty()) else {
        return Ok(SearchOutcome::All(repo.list_topics().await?));
    };

    let found = repo.search_topics(needle).await?;
    if found.is_empty() {
        Ok(SearchOutcome::NoResults)
    } else {
        Ok(SearchOutcome::Matches(found))
    }
}

/// create
///
/// Validates the raw form values and stores the topic as submitted (no trimming).
/// Returns the generated id.
pub async fn create(
    repo: &dyn Repository,
    title: Option<&str>,
    content: Option<&str>,
    client_ip: String,
) -> Result<i64, AppError> {
    if is_blank(title) {
        return Err(AppError::Validation("Topic name cannot be empty!".to_string()));
    }
    if is_blank(content) {
        return Err(AppError::Validation("Message cannot be empty!".to_string()));
    }
    let (title, content) = (title.unwrap_or_default(), content.unwrap_or_default());
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "Topic name cannot be longer than {MAX_TITLE_CHARS} characters!"
        )));
    }

    let id = repo
        .create_topic(NewTopic {
            title: title.to_string(),
            content: content.to_string(),
            date: today(),
            ip_address: client_ip,
        })
        .await?;
    tracing::info!(topic_id = id, "topic created");
    Ok(id)
}

pub async fn get_by_id(repo: &dyn Repository, id: i64) -> Result<Topic, AppError> {
    repo.get_topic(id).await?.ok_or(AppError::NotFound)
}

/// delete
///
/// Removes the topic together with all of its messages.
pub async fn delete(repo: &dyn Repository, id: i64) -> Result<(), AppError> {
    if repo.delete_topic(id).await? {
        tracing::info!(topic_id = id, "topic deleted with its messages");
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
