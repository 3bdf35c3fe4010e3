use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Everything behind the admin session flag. `/admin_login` and `/logout` are
/// reachable anonymously; every other handler here calls
/// `AdminSession::require_authenticated` first and redirects to the login page when
/// the session is anonymous.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET shows the password form, POST checks it and sets the session cookie.
        .route(
            "/admin_login",
            get(handlers::admin_login_form).post(handlers::admin_login),
        )
        .route("/admin", get(handlers::admin))
        // Clears the session cookie and goes back to the login page.
        .route("/logout", get(handlers::logout))
        // Destructive actions are plain links in the admin panel, hence GET.
        .route("/delete_message/{id}", get(handlers::delete_message))
        .route("/delete_topic/{id}", get(handlers::delete_topic))
}
