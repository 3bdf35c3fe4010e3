use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

// --- Module Structure ---

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod session;
pub mod views;

// Routing split by audience (public, admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{RepositoryState, SqliteRepository};
pub use session::SessionStore;
pub use views::Views;

use error::NotFoundPage;

/// AppState
///
/// The container shared by every request: the store handle, the admin session store,
/// the compiled views and the configuration loaded at startup.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: topics and messages.
    pub repo: RepositoryState,
    /// Session Layer: per-client admin flags keyed by session id.
    pub sessions: SessionStore,
    /// View Layer: compiled templates.
    pub views: Arc<Views>,
    /// Configuration: admin password, session secret and friends.
    pub config: AppConfig,
}

impl AppState {
    /// Compiles the views and bundles them with the repository and configuration.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Result<Self, tera::Error> {
        let views = Arc::new(Views::new(config.author_name.clone())?);
        Ok(Self {
            repo,
            sessions: SessionStore::new(),
            views,
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(app_state: &AppState) -> SessionStore {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// render_error_pages
///
/// Fills the body of every response tagged with `NotFoundPage` with the 404 view.
/// Handler-level 404s, wrong admin passwords and unmatched routes all pass through
/// here, which is what makes them indistinguishable.
async fn render_error_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.extensions().get::<NotFoundPage>().is_none() {
        return response;
    }

    match state.views.render("404.html", &json!({})) {
        Ok(page) => (StatusCode::NOT_FOUND, page).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Correlation header set on every request and echoed on every response.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Paths served by the admin router, tagged on the request span so admin activity
/// can be filtered out of the access log.
fn is_admin_path(path: &str) -> bool {
    ["/admin", "/logout", "/delete_topic/", "/delete_message/"]
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// create_router
///
/// Assembles the routes, the static file service, the 404 rendering and the
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let forum = Router::new()
        .merge(public::public_routes())
        .merge(admin::admin_routes())
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            render_error_pages,
        ))
        .with_state(state);

    let access_log = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            let path = request.uri().path();
            let req_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "forum_request",
                %req_id,
                method = %request.method(),
                path,
                admin = is_admin_path(path),
            )
        })
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    // Outermost first: the id must exist before the span reads it.
    forum.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(access_log)
            .layer(PropagateRequestIdLayer::new(request_id)),
    )
}
