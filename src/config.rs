use std::env;

use thiserror::Error;
use tracing::warn;

/// Fallbacks used only when running in `Env::Local`.
const LOCAL_ADMIN_PASSWORD: &str = "local-admin-password";
const LOCAL_SESSION_SECRET: &str = "local-session-secret-change-me";

/// AppConfig
///
/// Holds the application's configuration, loaded once at startup and shared through
/// `AppState` via `FromRef`. Nothing in the crate reads the process environment after
/// `AppConfig::load` returns.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string, e.g. `sqlite://forum.db`.
    pub db_url: String,
    // Plain-text secret compared against the admin login form.
    pub admin_password: String,
    // HMAC key used to sign the admin session cookie.
    pub session_secret: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Directory served under `/static`.
    pub static_dir: String,
    // Shown on the admin login page.
    pub author_name: String,
    // Runtime environment marker. Controls secret fallbacks and log format.
    pub env: Env,
}

/// Env
///
/// Local runs may fall back to development secrets; production runs may not.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
}

impl Default for AppConfig {
    /// Deterministic values for tests; never touches the environment.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            admin_password: "test-admin-password".to_string(),
            session_secret: "test-session-secret-value-0123456789".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            static_dir: "static".to_string(),
            author_name: "Admin".to_string(),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. In production the admin
    /// password and the session secret have no fallback: a deployment that forgets to
    /// set them refuses to start instead of running with a known secret.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let admin_password = secret(&env, "ADMIN_PASSWORD", LOCAL_ADMIN_PASSWORD)?;
        let session_secret = secret(&env, "SESSION_SECRET", LOCAL_SESSION_SECRET)?;

        Ok(Self {
            db_url: var_or("DATABASE_URL", "sqlite://forum.db"),
            admin_password,
            session_secret,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            static_dir: var_or("STATIC_DIR", "static"),
            author_name: var_or("AUTHOR_NAME", "Admin"),
            env,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secret(env: &Env, key: &'static str, local_fallback: &str) -> Result<String, ConfigError> {
    match (env::var(key), env) {
        (Ok(value), _) if !value.is_empty() => Ok(value),
        (_, Env::Production) => Err(ConfigError::Missing(key)),
        (_, Env::Local) => {
            warn!("{key} not set, using the local development fallback");
            Ok(local_fallback.to_string())
        }
    }
}
