use std::{convert::Infallible, net::SocketAddr};

use axum::{
    Form,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{error::AppError, services::client_ip_or_unknown};

/// EntityId
///
/// The single numeric path segment of `/topic/{id}` and friends. Anything that is
/// not an integer answers 404, the same as a route that does not exist.
#[derive(Debug, Clone, Copy)]
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        raw.parse().map(EntityId).map_err(|_| AppError::NotFound)
    }
}

/// ClientIp
///
/// Peer address recorded on new topics and messages. Falls back to `"Unknown"` when
/// the server was not started with connect info (e.g. when a test drives the router
/// directly).
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(client_ip_or_unknown(addr)))
    }
}

/// FormFields
///
/// A urlencoded form body that never rejects. A missing or mistyped body, or one
/// that does not parse, yields `T::default()`, so the services' own rules pick the
/// status (400 for blank fields, 404 for a failed login). A repeated field keeps
/// its first value.
#[derive(Debug, Clone, Default)]
pub struct FormFields<T>(pub T);

impl<S, T> FromRequest<S> for FormFields<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<Vec<(String, String)>>::from_request(req, state).await {
            Ok(Form(pairs)) => Ok(FormFields(first_values(pairs))),
            Err(rejection) => {
                tracing::debug!("unreadable form body treated as empty: {}", rejection);
                Ok(FormFields(T::default()))
            }
        }
    }
}

fn first_values<T: DeserializeOwned + Default>(pairs: Vec<(String, String)>) -> T {
    let mut fields = Map::new();
    for (key, value) in pairs {
        fields.entry(key).or_insert(Value::String(value));
    }
    serde_json::from_value(Value::Object(fields)).unwrap_or_default()
}
