use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use cookie::{Cookie, SameSite};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::services::session_service;
use crate::web::AppState;

pub const SESSION_COOKIE: &str = "fne_session";
pub const API_KEY_HEADER: &str = "x-dvmfne-manager-api-key";

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
}

/// Per-request login state, inserted by [`load_session`] on every route.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

impl CurrentUser {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw))
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}

pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut user = None;

    if let Some(token) = session_token(request.headers()) {
        match session_service::resolve_session(
            &state.pool,
            &token,
            state.config.server.session_ttl_hours,
        )
        .await
        {
            Ok(Some(row)) => {
                user = Some(AuthenticatedUser {
                    id: row.user_id,
                    username: row.username,
                })
            }
            Ok(None) => {}
            Err(e) => warn!("Session lookup failed: {}", e),
        }
    }

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

pub async fn require_auth(request: Request, next: Next) -> Response {
    let logged_in = request
        .extensions()
        .get::<CurrentUser>()
        .map(CurrentUser::is_authenticated)
        .unwrap_or(false);

    if logged_in {
        next.run(request).await
    } else {
        Redirect::to("/").into_response()
    }
}

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.api.auth_disabled {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|hv| hv.to_str().ok());

    let valid = match (provided, state.config.api.key.as_deref()) {
        (Some(provided), Some(expected)) => provided.as_bytes().ct_eq(expected.as_bytes()).into(),
        _ => false,
    };

    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Unauthorized: Invalid API key",
                "status": 401
            })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_token_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; fne_session=abc123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn empty_or_missing_cookie_means_no_session() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());
        headers.insert(header::COOKIE, HeaderValue::from_static("fne_session="));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn session_cookie_is_http_only() {
        let rendered = session_cookie("tok".to_string()).to_string();
        assert!(rendered.starts_with("fne_session=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(removal_cookie().to_string().contains("Max-Age=0"));
    }
}
