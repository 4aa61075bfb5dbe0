use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::error;

use crate::error::WatchedPeerError;
use crate::services::watched_peer_service::{self, WatchedPeerInput, WatchedPeerView};
use crate::web::middleware::auth::CurrentUser;
use crate::web::{notice_redirect, render, AppState, NoticeQuery, PageContext};

const LIST_PATH: &str = "/manageWatchedPeers";

#[derive(Template)]
#[template(path = "watched_peers.html")]
pub struct WatchedPeersTemplate {
    pub page: PageContext,
    pub peers: Vec<WatchedPeerView>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WatchedPeerForm {
    #[serde(rename = "peerId")]
    pub peer_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "discordWebhookUrl")]
    pub discord_webhook_url: Option<String>,
}

impl WatchedPeerForm {
    fn input(self) -> WatchedPeerInput {
        WatchedPeerInput {
            name: self.name,
            email: self.email,
            phone: self.phone,
            discord_webhook_url: self.discord_webhook_url,
        }
    }
}

pub async fn list_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    match watched_peer_service::load_watched_peers(&state.pool).await {
        Ok(peers) => render(&WatchedPeersTemplate {
            page: PageContext::new(&state, &current),
            peers,
            error: query.error,
        }),
        Err(e) => database_error("Listing watched peers", e),
    }
}

pub async fn add_handler(State(state): State<AppState>, Form(form): Form<WatchedPeerForm>) -> Response {
    let peer_id = form.peer_id.clone().unwrap_or_default();
    match watched_peer_service::add_watched_peer(&state.pool, &peer_id, &form.input()).await {
        Ok(()) => Redirect::to(LIST_PATH).into_response(),
        Err(e @ (WatchedPeerError::Invalid(_) | WatchedPeerError::AlreadyWatched)) => {
            Redirect::to(&notice_redirect(LIST_PATH, "error", &e.to_string())).into_response()
        }
        Err(WatchedPeerError::Database(e)) => database_error("Adding watched peer", e),
    }
}

pub async fn edit_handler(
    State(state): State<AppState>,
    Path(peer_id): Path<String>,
    Form(form): Form<WatchedPeerForm>,
) -> Response {
    match watched_peer_service::update_watched_peer(&state.pool, &peer_id, &form.input()).await {
        Ok(_) => Redirect::to(LIST_PATH).into_response(),
        Err(e) => database_error("Updating watched peer", e),
    }
}

pub async fn delete_handler(State(state): State<AppState>, Path(peer_id): Path<String>) -> Response {
    match watched_peer_service::delete_watched_peer(&state.pool, &peer_id).await {
        Ok(_) => Redirect::to(LIST_PATH).into_response(),
        Err(e) => database_error("Deleting watched peer", e),
    }
}

fn database_error(action: &str, err: sqlx::Error) -> Response {
    error!("{} failed: {}", action, err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
}
