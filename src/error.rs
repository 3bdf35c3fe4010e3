use axum::{
    Extension,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Where anonymous visitors of admin-only pages are sent.
pub const LOGIN_PATH: &str = "/admin_login";

/// Response extension asking the error-page middleware to render the 404 view.
#[derive(Clone, Copy, Debug)]
pub struct NotFoundPage;

/// AppError
///
/// Every request-scoped failure. None of these stop the server; each one becomes a
/// response for the single request that produced it.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required field was missing, blank or too long.
    #[error("{0}")]
    Validation(String),

    /// The id did not resolve, the route is unknown, or the admin password was wrong.
    #[error("Not found")]
    NotFound,

    /// An admin-only page was requested by an anonymous session.
    #[error("Admin login required")]
    LoginRequired,

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Session error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            // The body is filled in by `render_error_pages`, so handler 404s and
            // unmatched routes produce the same page.
            AppError::NotFound => (StatusCode::NOT_FOUND, Extension(NotFoundPage)).into_response(),
            AppError::LoginRequired => Redirect::to(LOGIN_PATH).into_response(),
            AppError::Persistence(e) => {
                tracing::error!("persistence failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Oops.. There is something wrong. Please try again or check the logs.",
                )
                    .into_response()
            }
            AppError::Template(e) => {
                tracing::error!("template failure: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
            AppError::Session(e) => {
                tracing::error!("session signing failure: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to start session").into_response()
            }
        }
    }
}
