//! One-shot notices carried in the session until the next page render,
//! plus the `302 Found` redirect used by the page-flow routes.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

const NOTICES_KEY: &str = "notices";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub async fn push(session: &Session, level: NoticeLevel, message: impl Into<String>) {
    let mut notices: Vec<Notice> = session
        .get(NOTICES_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    notices.push(Notice {
        level,
        message: message.into(),
    });

    if let Err(e) = session.insert(NOTICES_KEY, notices).await {
        tracing::warn!(error = %e, "Failed to store notice in session");
    }
}

/// Drains pending notices.
pub async fn take(session: &Session) -> Vec<Notice> {
    session
        .remove::<Vec<Notice>>(NOTICES_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Stores a notice and redirects.
pub async fn redirect_with(
    session: &Session,
    location: &str,
    level: NoticeLevel,
    message: impl Into<String>,
) -> Response {
    push(session, level, message).await;
    found(location)
}
