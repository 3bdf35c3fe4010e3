use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use mini_forum::{
    AppState, SqliteRepository,
    config::AppConfig,
    create_router,
    models::{Message, NewMessage, NewTopic, Topic},
    repository::{Repository, RepositoryState},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{str::FromStr, sync::Arc};
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "test-admin-password";

// --- Test Utilities ---

async fn sqlite_repo() -> RepositoryState {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite");
    let repo = SqliteRepository::new(pool);
    repo.init_schema().await.unwrap();
    Arc::new(repo)
}

fn app_with(repo: RepositoryState) -> Router {
    create_router(AppState::new(repo, AppConfig::default()).expect("templates compile"))
}

async fn test_app() -> Router {
    app_with(sqlite_repo().await)
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect carries a Location")
        .to_str()
        .unwrap()
}

/// Logs in and returns the `name=value` cookie pair for later requests.
async fn admin_cookie(app: &Router) -> String {
    let response = send(
        app,
        post_form("/admin_login", &format!("password_input={ADMIN_PASSWORD}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn create_topic(app: &Router, title: &str, content: &str) -> String {
    let response = send(
        app,
        post_form(
            "/create_topic",
            &format!("topic_title={title}&topic_content={content}"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response).to_string()
}

// --- Public Pages ---

#[tokio::test]
async fn test_static_pages_render() {
    let app = test_app().await;
    for uri in ["/", "/contact", "/rules", "/create_topic", "/admin_login"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }
}

#[tokio::test]
async fn test_create_topic_and_reply_end_to_end() {
    let app = test_app().await;

    let topic_url = create_topic(&app, "Hello", "World").await;
    assert!(topic_url.starts_with("/topic/"));
    let id = topic_url.trim_start_matches("/topic/").to_string();

    let response = send(&app, get(&topic_url, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Hello"));
    assert!(page.contains("World"));
    assert!(page.contains("0 message(s)"));

    let response = send(&app, post_form(&format!("/add_message/{id}"), "message=Hi")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let confirmation = body_text(response).await;
    assert!(confirmation.contains("Message sent"));
    assert!(confirmation.contains("Hi"));

    let page = body_text(send(&app, get(&topic_url, None)).await).await;
    assert!(page.contains("1 message(s)"));
    assert!(page.contains(r#"<p class="message-content">Hi</p>"#));
}

#[tokio::test]
async fn test_messages_and_topics_show_newest_first() {
    let app = test_app().await;
    let topic_url = create_topic(&app, "Older", "x").await;
    create_topic(&app, "Newer", "y").await;

    let index = body_text(send(&app, get("/", None)).await).await;
    assert!(index.find("Newer").unwrap() < index.find("Older").unwrap());

    let id = topic_url.trim_start_matches("/topic/");
    send(&app, post_form(&format!("/add_message/{id}"), "message=first-reply")).await;
    send(&app, post_form(&format!("/add_message/{id}"), "message=second-reply")).await;
    let page = body_text(send(&app, get(&topic_url, None)).await).await;
    assert!(page.find("second-reply").unwrap() < page.find("first-reply").unwrap());
}

#[tokio::test]
async fn test_create_topic_with_blank_fields_is_bad_request() {
    let app = test_app().await;

    let response = send(&app, post_form("/create_topic", "topic_title=+++&topic_content=x")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Topic name cannot be empty!");

    let response = send(&app, post_form("/create_topic", "topic_title=ok")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Message cannot be empty!");

    let index = body_text(send(&app, get("/", None)).await).await;
    assert!(index.contains("No topics yet"));
}

#[tokio::test]
async fn test_add_message_validation_and_missing_topic() {
    let app = test_app().await;
    let topic_url = create_topic(&app, "t", "c").await;
    let id = topic_url.trim_start_matches("/topic/");

    let response = send(&app, post_form(&format!("/add_message/{id}"), "message=")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, post_form("/add_message/999", "message=hi")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/add_message/999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get(&format!("/add_message/{id}"), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// A POST with no body and no content type.
fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_bodiless_posts_count_as_empty_fields() {
    let app = test_app().await;
    let topic_url = create_topic(&app, "t", "c").await;
    let id = topic_url.trim_start_matches("/topic/");

    let response = send(&app, post_empty("/create_topic")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Topic name cannot be empty!");

    let response = send(&app, post_empty(&format!("/add_message/{id}"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Message cannot be empty!");

    let response = send(&app, post_empty("/add_message/999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bodiless_login_looks_like_unknown_route() {
    let app = test_app().await;
    let unknown_body = body_text(send(&app, get("/definitely-missing", None)).await).await;

    let response = send(&app, post_empty("/admin_login")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_text(response).await, unknown_body);
}

#[tokio::test]
async fn test_repeated_form_field_uses_first_value() {
    let app = test_app().await;
    let response = send(
        &app,
        post_form("/create_topic", "topic_title=first&topic_title=second&topic_content=c"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = body_text(send(&app, get(location(&response), None)).await).await;
    assert!(page.contains("first"));
    assert!(!page.contains("second"));
}

#[tokio::test]
async fn test_missing_topic_renders_the_404_page() {
    let app = test_app().await;
    let unknown_route = body_text(send(&app, get("/no/such/page", None)).await).await;

    for uri in ["/topic/999", "/topic/not-a-number"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {uri}");
        assert_eq!(body_text(response).await, unknown_route);
    }
    assert!(unknown_route.contains("does not exist"));
}

#[tokio::test]
async fn test_search_outcomes() {
    let app = test_app().await;
    create_topic(&app, "Learning+Rust", "c").await;
    create_topic(&app, "Gardening", "c").await;

    let response = send(&app, get("/search_topics?searched_topic=rust", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Learning Rust"));
    assert!(!page.contains("Gardening"));

    let page = body_text(send(&app, get("/search_topics?searched_topic=chess", None)).await).await;
    assert!(page.contains("No topic found"));

    let page = body_text(send(&app, get("/search_topics", None)).await).await;
    assert!(page.contains("Learning Rust"));
    assert!(page.contains("Gardening"));

    // POST reads the query string too.
    let response = send(&app, post_form("/search_topics?searched_topic=garden", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Gardening"));
}

// --- Admin ---

#[tokio::test]
async fn test_admin_requires_login() {
    let app = test_app().await;
    for uri in ["/admin", "/delete_topic/1", "/delete_message/1"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {uri}");
        assert_eq!(location(&response), "/admin_login");
    }
}

#[tokio::test]
async fn test_wrong_password_looks_like_unknown_route() {
    let app = test_app().await;
    let unknown = send(&app, get("/definitely-missing", None)).await;
    let unknown_status = unknown.status();
    let unknown_body = body_text(unknown).await;

    let response = send(&app, post_form("/admin_login", "password_input=nope")).await;
    assert_eq!(response.status(), unknown_status);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_text(response).await, unknown_body);
}

#[tokio::test]
async fn test_admin_panel_and_deletes() {
    let app = test_app().await;
    let topic_url = create_topic(&app, "Spam", "buy now").await;
    let id = topic_url.trim_start_matches("/topic/").to_string();
    send(&app, post_form(&format!("/add_message/{id}"), "message=more+spam")).await;

    let cookie = admin_cookie(&app).await;

    let response = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let panel = body_text(response).await;
    assert!(panel.contains("Admin panel"));
    assert!(panel.contains("Spam"));
    assert!(panel.contains("more spam"));

    let response = send(&app, get("/delete_message/1", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin");
    let response = send(&app, get("/delete_message/1", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get(&format!("/delete_topic/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = send(&app, get(&topic_url, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_topic_removes_its_messages() {
    let app = test_app().await;
    let topic_url = create_topic(&app, "Thread", "c").await;
    let id = topic_url.trim_start_matches("/topic/").to_string();
    send(&app, post_form(&format!("/add_message/{id}"), "message=child")).await;
    let cookie = admin_cookie(&app).await;

    send(&app, get(&format!("/delete_topic/{id}"), Some(&cookie))).await;

    let panel = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(panel.contains("Messages (0)"));
    assert!(panel.contains("Topics (0)"));
}

#[tokio::test]
async fn test_logout_closes_admin_access() {
    let app = test_app().await;
    let cookie = admin_cookie(&app).await;
    assert_eq!(
        send(&app, get("/admin", Some(&cookie))).await.status(),
        StatusCode::OK
    );

    let response = send(&app, get("/logout", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin_login");
    assert!(response.headers().get(header::SET_COOKIE).is_some());

    // Even replaying the old cookie no longer works.
    for uri in ["/admin", "/delete_topic/1", "/delete_message/1"] {
        let response = send(&app, get(uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {uri}");
        assert_eq!(location(&response), "/admin_login");
    }
}

#[tokio::test]
async fn test_requests_carry_a_request_id() {
    let app = test_app().await;
    let response = send(&app, get("/", None)).await;
    assert!(response.headers().get("x-request-id").is_some());
}

// --- Persistence Failures ---

/// A store whose every write fails, to exercise the 500 paths.
struct FailingWrites {
    topic: Topic,
}

fn store_down() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

#[async_trait]
impl Repository for FailingWrites {
    async fn list_topics(&self) -> Result<Vec<Topic>, sqlx::Error> {
        Ok(vec![self.topic.clone()])
    }
    async fn search_topics(&self, _needle: &str) -> Result<Vec<Topic>, sqlx::Error> {
        Err(store_down())
    }
    async fn get_topic(&self, id: i64) -> Result<Option<Topic>, sqlx::Error> {
        Ok((id == self.topic.id).then(|| self.topic.clone()))
    }
    async fn create_topic(&self, _topic: NewTopic) -> Result<i64, sqlx::Error> {
        Err(store_down())
    }
    async fn delete_topic(&self, _id: i64) -> Result<bool, sqlx::Error> {
        Err(store_down())
    }
    async fn list_messages(&self) -> Result<Vec<Message>, sqlx::Error> {
        Ok(vec![])
    }
    async fn list_messages_for_topic(&self, _topic_id: i64) -> Result<Vec<Message>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_message(&self, _id: i64) -> Result<Option<Message>, sqlx::Error> {
        Ok(None)
    }
    async fn create_message(&self, _message: NewMessage) -> Result<i64, sqlx::Error> {
        Err(store_down())
    }
    async fn delete_message(&self, _id: i64) -> Result<bool, sqlx::Error> {
        Err(store_down())
    }
}

fn failing_app() -> Router {
    app_with(Arc::new(FailingWrites {
        topic: Topic {
            id: 1,
            title: "Existing".to_string(),
            content: "c".to_string(),
            date: "01/01/2025".to_string(),
            ip_address: "Unknown".to_string(),
        },
    }))
}

#[tokio::test]
async fn test_store_failures_are_internal_errors() {
    let app = failing_app();

    let response = send(&app, post_form("/create_topic", "topic_title=a&topic_content=b")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = send(&app, post_form("/add_message/1", "message=hi")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = send(&app, get("/search_topics?searched_topic=x", None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let cookie = admin_cookie(&app).await;
    for uri in ["/delete_topic/1", "/delete_message/1"] {
        let response = send(&app, get(uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "GET {uri}");
    }
}

#[tokio::test]
async fn test_validation_runs_before_the_store() {
    let app = failing_app();
    let response = send(&app, post_form("/create_topic", "topic_title=&topic_content=b")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
