use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints any visitor can reach without logging in.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // All topics, newest first.
        .route("/", get(handlers::index))
        // Static informational pages.
        .route("/contact", get(handlers::contact))
        .route("/rules", get(handlers::rules))
        // GET|POST /search_topics?searched_topic=...
        // Both methods read the query string.
        .route(
            "/search_topics",
            get(handlers::search_topics).post(handlers::search_topics),
        )
        // GET shows the form, POST creates and redirects to /topic/{id}.
        .route(
            "/create_topic",
            get(handlers::create_topic_form).post(handlers::create_topic),
        )
        .route("/topic/{id}", get(handlers::topic))
        // GET shows the reply form, POST stores the message and confirms it.
        .route(
            "/add_message/{topic_id}",
            get(handlers::add_message_form).post(handlers::add_message),
        )
}
