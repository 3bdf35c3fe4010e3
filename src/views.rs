use axum::response::Html;
use chrono::{Datelike, Local};
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::AppError;

/// Every page the forum can render, compiled into the binary.
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("contact.html", include_str!("../templates/contact.html")),
    ("rules.html", include_str!("../templates/rules.html")),
    ("search_topics.html", include_str!("../templates/search_topics.html")),
    ("no_topic_founded.html", include_str!("../templates/no_topic_founded.html")),
    ("create_topic.html", include_str!("../templates/create_topic.html")),
    ("topic.html", include_str!("../templates/topic.html")),
    ("add_message.html", include_str!("../templates/add_message.html")),
    ("result.html", include_str!("../templates/result.html")),
    ("admin_login.html", include_str!("../templates/admin_login.html")),
    ("admin.html", include_str!("../templates/admin.html")),
    ("404.html", include_str!("../templates/404.html")),
];

/// Views
///
/// The compiled template set. Built once at startup and shared read-only through
/// `AppState`. Tera escapes every `.html` template, so user text is never emitted raw.
pub struct Views {
    tera: Tera,
    author_name: String,
}

impl Views {
    pub fn new(author_name: impl Into<String>) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        // Registered together so `{% extends %}` resolves regardless of order.
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self {
            tera,
            author_name: author_name.into(),
        })
    }

    /// render
    ///
    /// Renders `name` with `data` (any struct or map that serializes to an object)
    /// plus the footer `year` and the site `author_name`.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<Html<String>, AppError> {
        let mut context = Context::from_serialize(data)?;
        context.insert("year", &Local::now().year());
        context.insert("author_name", &self.author_name);
        Ok(Html(self.tera.render(name, &context)?))
    }
}
