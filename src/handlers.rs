use crate::{
    AppState,
    error::{AppError, LOGIN_PATH},
    extract::{ClientIp, EntityId, FormFields},
    models::{AddMessageForm, AdminLoginForm, CreateTopicForm, SearchQuery},
    services::{
        messages, newest_first,
        topics::{self, SearchOutcome},
    },
    session::AdminSession,
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;

// --- Public Pages ---

/// index
///
/// `GET /`: every topic, newest first.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let all_topics = topics::list_all(state.repo.as_ref()).await?;
    state
        .views
        .render("index.html", &json!({ "all_topics": newest_first(all_topics) }))
}

pub async fn contact(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.views.render("contact.html", &json!({}))
}

pub async fn rules(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.views.render("rules.html", &json!({}))
}

/// search_topics
///
/// `GET|POST /search_topics?searched_topic=...`. The query is always read from the
/// query string, whatever the method. A query with no match renders its own page
/// instead of an empty list.
pub async fn search_topics(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let query = params.searched_topic.unwrap_or_default();

    match topics::search(state.repo.as_ref(), Some(query.as_str())).await? {
        SearchOutcome::NoResults => state
            .views
            .render("no_topic_founded.html", &json!({ "searched_topic": query })),
        SearchOutcome::All(found) | SearchOutcome::Matches(found) => state.views.render(
            "search_topics.html",
            &json!({ "results": newest_first(found), "query": query }),
        ),
    }
}

pub async fn create_topic_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.views.render("create_topic.html", &json!({}))
}

/// create_topic
///
/// `POST /create_topic`. Blank fields answer 400; on success the client is sent to
/// the new topic's page.
pub async fn create_topic(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    FormFields(form): FormFields<CreateTopicForm>,
) -> Result<Redirect, AppError> {
    let id = topics::create(
        state.repo.as_ref(),
        form.topic_title.as_deref(),
        form.topic_content.as_deref(),
        client_ip,
    )
    .await?;
    Ok(Redirect::to(&format!("/topic/{id}")))
}

/// topic
///
/// `GET /topic/{id}`: the topic and its messages, newest first.
pub async fn topic(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Html<String>, AppError> {
    let current = topics::get_by_id(state.repo.as_ref(), id).await?;
    let msgs = messages::list_for_topic(state.repo.as_ref(), id).await?;
    state.views.render(
        "topic.html",
        &json!({ "topic": current, "msgs": newest_first(msgs) }),
    )
}

pub async fn add_message_form(
    State(state): State<AppState>,
    EntityId(topic_id): EntityId,
) -> Result<Html<String>, AppError> {
    let current = topics::get_by_id(state.repo.as_ref(), topic_id).await?;
    state.views.render(
        "add_message.html",
        &json!({ "title": current.title, "topic_id": topic_id }),
    )
}

/// add_message
///
/// `POST /add_message/{topic_id}`. Renders a confirmation page showing the stored
/// message rather than redirecting.
pub async fn add_message(
    State(state): State<AppState>,
    EntityId(topic_id): EntityId,
    ClientIp(client_ip): ClientIp,
    FormFields(form): FormFields<AddMessageForm>,
) -> Result<Html<String>, AppError> {
    let message =
        messages::create(state.repo.as_ref(), topic_id, form.message.as_deref(), client_ip).await?;
    state.views.render(
        "result.html",
        &json!({ "input_content": message.content, "topic_id": topic_id }),
    )
}

// --- Admin ---

pub async fn admin_login_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.views.render("admin_login.html", &json!({}))
}

/// admin_login
///
/// `POST /admin_login`. A correct password sets the session cookie and opens the
/// panel; a wrong one gets the ordinary 404 page so the endpoint reveals nothing.
pub async fn admin_login(
    State(state): State<AppState>,
    mut session: AdminSession,
    FormFields(form): FormFields<AdminLoginForm>,
) -> Result<Response, AppError> {
    let cookie = session
        .login(&state.config, &state.sessions, form.password_input.as_deref())
        .await?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/admin")).into_response())
}

/// admin
///
/// `GET /admin`: every topic and every message, each with its delete link.
pub async fn admin(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Html<String>, AppError> {
    session.require_authenticated()?;
    let all_topics = topics::list_all(state.repo.as_ref()).await?;
    let all_messages = messages::list_all(state.repo.as_ref()).await?;
    state.views.render(
        "admin.html",
        &json!({ "topics": all_topics, "messages": all_messages }),
    )
}

pub async fn logout(State(state): State<AppState>, mut session: AdminSession) -> Response {
    let cookie = session.logout(&state.sessions).await;
    ([(header::SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response()
}

pub async fn delete_message(
    State(state): State<AppState>,
    session: AdminSession,
    EntityId(id): EntityId,
) -> Result<Redirect, AppError> {
    session.require_authenticated()?;
    messages::delete(state.repo.as_ref(), id).await?;
    Ok(Redirect::to("/admin"))
}

/// delete_topic
///
/// Removes the topic and, in the same transaction, all of its messages.
pub async fn delete_topic(
    State(state): State<AppState>,
    session: AdminSession,
    EntityId(id): EntityId,
) -> Result<Redirect, AppError> {
    session.require_authenticated()?;
    topics::delete(state.repo.as_ref(), id).await?;
    Ok(Redirect::to("/admin"))
}

/// Fallback for every unmatched route.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
