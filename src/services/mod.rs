//! Validation and lookup rules on top of the `Repository` contract.
//!
//! Services speak `AppError`: they turn absent rows into `NotFound` and blank input
//! into `Validation`, so handlers only decide which view to render.

pub mod messages;
pub mod topics;

use std::net::SocketAddr;

use chrono::Local;

use crate::models::UNKNOWN_IP;

/// Creation date as stored on topics and messages (`DD/MM/YYYY`).
pub fn today() -> String {
    Local::now().format("%d/%m/%Y").to_string()
}

/// Text form of the client address, `"Unknown"` when the transport did not record one.
pub fn client_ip_or_unknown(addr: Option<SocketAddr>) -> String {
    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// `true` for `None`, `""` and whitespace-only input.
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Reverses insertion order for display.
pub fn newest_first<T>(mut rows: Vec<T>) -> Vec<T> {
    rows.reverse();
    rows
}
