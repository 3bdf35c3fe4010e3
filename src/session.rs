use std::{
    collections::HashMap,
    convert::Infallible,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use cookie::{Cookie, SameSite, time::Duration};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{config::AppConfig, error::AppError};

/// Name of the cookie carrying the signed session id.
pub const SESSION_COOKIE: &str = "forum_session";

/// How long an admin login stays valid.
pub const SESSION_TTL_SECS: u64 = 12 * 60 * 60;

/// SessionClaims
///
/// Payload of the signed cookie. It only names the session; whether that session is
/// logged in lives server-side in the `SessionStore`, so logging out really ends it.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy)]
struct SessionRecord {
    admin_logged_in: bool,
    expires_at: u64,
}

/// SessionStore
///
/// Per-client session data keyed by session id. The guard reads and writes a single
/// boolean per session.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `admin_logged_in` flag of `sid`; `false` for unknown or expired sessions.
    pub async fn admin_logged_in(&self, sid: Uuid) -> bool {
        let now = unix_now();
        self.inner
            .read()
            .await
            .get(&sid)
            .is_some_and(|record| record.admin_logged_in && record.expires_at > now)
    }

    /// Sets the flag on `sid` and drops every expired session.
    pub async fn set_admin_logged_in(&self, sid: Uuid, value: bool) {
        let now = unix_now();
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, record| record.expires_at > now);
        sessions.insert(
            sid,
            SessionRecord {
                admin_logged_in: value,
                expires_at: now + SESSION_TTL_SECS,
            },
        );
    }

    pub async fn remove(&self, sid: Uuid) {
        self.inner.write().await.remove(&sid);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// AdminSession
///
/// The admin session guard, resolved from the `forum_session` cookie before the
/// handler runs. A missing, expired, forged or logged-out cookie yields an anonymous
/// session; extraction never fails.
#[derive(Debug, Clone)]
pub struct AdminSession {
    state: SessionState,
    sid: Option<Uuid>,
}

impl AdminSession {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            sid: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// resolve
    ///
    /// Verifies the token's signature and expiry against `secret`, then looks the
    /// session up in `store`.
    pub async fn resolve(token: &str, secret: &str, store: &SessionStore) -> Self {
        let Some(sid) = verify_token(token, secret) else {
            return Self::anonymous();
        };
        let state = if store.admin_logged_in(sid).await {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        Self {
            state,
            sid: Some(sid),
        }
    }

    /// require_authenticated
    ///
    /// Gate for admin-only handlers. Anonymous sessions get `LoginRequired`, which
    /// renders as a redirect to the login page rather than an error.
    pub fn require_authenticated(&self) -> Result<(), AppError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            tracing::warn!("access denied: admin page visited without a login");
            Err(AppError::LoginRequired)
        }
    }

    /// login
    ///
    /// `Anonymous -> Authenticated` when `password` equals the configured admin
    /// password exactly, under a freshly issued session id. Returns the `Set-Cookie`
    /// value. A wrong or missing password leaves the session untouched and answers
    /// `NotFound`.
    pub async fn login(
        &mut self,
        config: &AppConfig,
        store: &SessionStore,
        password: Option<&str>,
    ) -> Result<String, AppError> {
        if password != Some(config.admin_password.as_str()) {
            tracing::warn!("admin login rejected");
            return Err(AppError::NotFound);
        }

        let sid = Uuid::new_v4();
        let token = issue_token(&config.session_secret, sid)?;
        if let Some(previous) = self.sid.replace(sid) {
            store.remove(previous).await;
        }
        store.set_admin_logged_in(sid, true).await;
        self.state = SessionState::Authenticated;
        tracing::info!(%sid, "admin session established");

        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(SESSION_TTL_SECS as i64))
            .build()
            .to_string())
    }

    /// logout
    ///
    /// Unconditionally anonymous: the session is dropped from `store`, so even a
    /// copy of the old cookie stops working. Returns the `Set-Cookie` value that
    /// clears the client's cookie.
    pub async fn logout(&mut self, store: &SessionStore) -> String {
        if let Some(sid) = self.sid.take() {
            store.remove(sid).await;
            tracing::info!(%sid, "admin session closed");
        }
        self.state = SessionState::Anonymous;

        let mut removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
        removal.make_removal();
        removal.to_string()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Signs a session token naming `sid`.
pub fn issue_token(secret: &str, sid: Uuid) -> Result<String, AppError> {
    let now = unix_now();
    let claims = SessionClaims {
        sid,
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
}

/// The session id inside `token`, if its signature and expiry check out.
pub fn verify_token(token: &str, secret: &str) -> Option<Uuid> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    match decode::<SessionClaims>(token, &key, &Validation::new(Algorithm::HS256)) {
        Ok(data) => Some(data.claims.sid),
        Err(e) => {
            tracing::debug!("discarding session cookie: {:?}", e.kind());
            None
        }
    }
}

fn session_cookie(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    // The signing secret comes from the shared configuration.
    AppConfig: FromRef<S>,
    SessionStore: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = session_cookie(parts) else {
            return Ok(AdminSession::anonymous());
        };
        let config = AppConfig::from_ref(state);
        let store = SessionStore::from_ref(state);
        Ok(AdminSession::resolve(&token, &config.session_secret, &store).await)
    }
}
