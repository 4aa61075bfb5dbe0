pub mod app;
pub mod middleware;
pub mod routes;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::error;

use crate::web::middleware::auth::CurrentUser;

pub use app::{build_router, AppState};

/// Values every page layout needs.
pub struct PageContext {
    pub name: String,
    pub user: Option<String>,
    pub build_id: &'static str,
}

impl PageContext {
    pub fn new(state: &AppState, current: &CurrentUser) -> Self {
        Self {
            name: state.config.server.name.clone(),
            user: current.0.as_ref().map(|u| u.username.clone()),
            build_id: option_env!("FNE_MANAGER_BUILD_ID").unwrap_or("dev"),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `?error=` notice carried back to a list page after a rejected form post.
#[derive(Debug, Deserialize, Default)]
pub struct NoticeQuery {
    pub error: Option<String>,
}

/// Builds `path?key=message` for the flash-style notices the list pages show.
pub fn notice_redirect(path: &str, key: &str, message: &str) -> String {
    format!("{}?{}={}", path, key, message.replace(' ', "+"))
}
