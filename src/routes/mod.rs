//! Router Module Index
//!
//! Splits the forum's routes by audience. Access control for the admin side is
//! enforced inside each handler through the `AdminSession` guard, so a route added
//! here cannot skip it by accident of layering.

/// Pages open to every visitor: browsing, searching, posting.
pub mod public;

/// Login, logout, the admin panel and the destructive endpoints.
pub mod admin;
