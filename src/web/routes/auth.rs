use askama::Template;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use cookie::Cookie;
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::{error, info, warn};

use crate::services::{session_service, user_service};
use crate::web::middleware::auth::{removal_cookie, session_cookie, session_token, CurrentUser};
use crate::web::{render, AppState, PageContext};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

pub async fn login_page(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    render(&LoginTemplate {
        page: PageContext::new(&state, &current),
        message: None,
    })
}

pub async fn auth_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    info!(user = %form.username, ip = %ip, "Auth request");

    let user = match user_service::authenticate(&state.pool, &form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            error!("Auth lookup failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(user) = user else {
        info!(user = %form.username, ip = %ip, "Auth request failed");
        return render(&LoginTemplate {
            page: PageContext::new(&state, &current),
            message: Some("Invalid username or password".to_string()),
        });
    };

    let ttl_hours = state.config.server.session_ttl_hours;
    if let Err(e) = session_service::purge_expired(&state.pool, ttl_hours).await {
        warn!("Could not purge expired sessions: {}", e);
    }

    let token = match session_service::start_session(&state.pool, user.id).await {
        Ok(token) => token,
        Err(e) => {
            error!("Could not create session for {}: {}", user.username, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    info!(user = %user.username, ip = %ip, "Auth request granted");
    with_cookie(Redirect::to("/").into_response(), session_cookie(token))
}

pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(e) = session_service::end_session(&state.pool, &token).await {
            warn!("Could not delete session: {}", e);
        }
    }
    with_cookie(Redirect::to("/").into_response(), removal_cookie())
}

fn with_cookie(mut response: Response, cookie: Cookie<'static>) -> Response {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => error!("Session cookie is not a valid header value: {}", e),
    }
    response
}

// The console usually sits behind a reverse proxy, so the forwarded address wins.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
