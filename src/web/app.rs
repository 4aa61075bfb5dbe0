use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;
use crate::services::fne_client::FneSource;
use crate::web::middleware::auth as auth_middleware;
use crate::web::routes::{
    api, auth, fne, inclusions, pages, peer_map, talkgroups, users, watched_peers,
};

/// Everything a handler may need, injected once at router construction.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub fne: Arc<dyn FneSource>,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/peerMapInclusions", get(inclusions::list_handler))
        .route("/addInclusion", post(inclusions::add_handler))
        .route("/deleteInclusion/:id", post(inclusions::delete_handler))
        .route("/manageWatchedPeers", get(watched_peers::list_handler))
        .route("/addWatchedPeer", post(watched_peers::add_handler))
        .route("/editWatchedPeer/:peer_id", post(watched_peers::edit_handler))
        .route(
            "/deleteWatchedPeer/:peer_id",
            post(watched_peers::delete_handler),
        )
        .route("/users", get(users::list_handler))
        .route("/addUser", post(users::add_handler))
        .route("/editUser", post(users::edit_handler))
        .route("/deleteUser", post(users::delete_handler))
        .route("/fnePeerList", get(fne::peer_list_handler))
        .route("/fneStatus", get(fne::status_handler))
        .route("/fneAffiliationList", get(fne::affiliation_list_handler))
        .route("/tg_rules", get(talkgroups::tg_rules_handler))
        .route("/writeTgRuleChanges", post(talkgroups::write_rules_handler))
        .route_layer(middleware::from_fn(auth_middleware::require_auth));

    let api_routes = Router::new()
        .route("/api/stats", get(api::stats_handler))
        .route("/api/tg/list", get(api::tg_list_handler))
        .route("/api/rid/list", get(api::rid_list_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_api_key,
        ));

    let public_dir = state.config.server.public_dir.clone();

    Router::new()
        // Public routes
        .route("/", get(pages::landing_handler))
        .route("/fnePeerMap", get(peer_map::peer_map_handler))
        .route("/pui/talkgroups", get(talkgroups::public_talkgroups_handler))
        .route("/login", get(auth::login_page))
        .route("/auth", post(auth::auth_handler))
        .route("/logout", get(auth::logout_handler))
        // Session and API routes
        .merge(protected_routes)
        .merge(api_routes)
        .fallback(pages::not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::load_session,
        ))
        // Static files
        .nest_service("/public", ServeDir::new(public_dir))
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
