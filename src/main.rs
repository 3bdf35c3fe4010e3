use std::{net::SocketAddr, str::FromStr, sync::Arc};

use mini_forum::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{RepositoryState, SqliteRepository},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::net::TcpListener;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 1. Configuration. `.env` is optional; production refuses to start without its
    // secrets.
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: RUST_LOG wins, otherwise these defaults. Human-readable output
    // locally, one JSON object per line in production.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mini_forum=debug,tower_http=info,sqlx=warn".into());
    let output = match config.env {
        Env::Local => tracing_subscriber::fmt::layer().pretty().boxed(),
        Env::Production => tracing_subscriber::fmt::layer().json().boxed(),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(output)
        .init();

    tracing::info!(
        env = ?config.env,
        database = %config.db_url,
        static_dir = %config.static_dir,
        "forum starting"
    );

    // 3. Database: open (creating the file if needed) and ensure the schema.
    let options = SqliteConnectOptions::from_str(&config.db_url)
        .expect("FATAL: DATABASE_URL is not a valid SQLite URL")
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("FATAL: Failed to open the SQLite database. Check DATABASE_URL.");

    let sqlite = SqliteRepository::new(pool);
    sqlite
        .init_schema()
        .await
        .expect("FATAL: Failed to create the database schema.");
    let repo = Arc::new(sqlite) as RepositoryState;

    // 4. State and router.
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(repo, config).expect("FATAL: Failed to compile templates.");
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");
    tracing::info!(%bind_addr, "forum listening");

    // Connect info lets handlers record the client address on new posts.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("HTTP server terminated unexpectedly");
}
