use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;

use crate::web::middleware::auth::CurrentUser;
use crate::web::{render, AppState, PageContext};

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub page: PageContext,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LandingQuery {
    pub message: Option<String>,
}

pub async fn landing_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<LandingQuery>,
) -> Response {
    render(&LandingTemplate {
        page: PageContext::new(&state, &current),
        message: query.message.filter(|m| !m.trim().is_empty()),
    })
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub page: PageContext,
}

pub async fn not_found_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let page = render(&NotFoundTemplate {
        page: PageContext::new(&state, &current),
    });
    (StatusCode::NOT_FOUND, page).into_response()
}
