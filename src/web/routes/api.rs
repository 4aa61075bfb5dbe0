use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::services::tg_rules_service;
use crate::web::AppState;

fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message, "status": status.as_u16() })),
    )
        .into_response()
}

/// FNE statistics, passed through as the FNE reports them.
pub async fn stats_handler(State(state): State<AppState>) -> Response {
    match state.fne.fetch_stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            warn!("API stats failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, "Error getting stats")
        }
    }
}

pub async fn tg_list_handler(State(state): State<AppState>) -> Response {
    match tg_rules_service::read_rules(&state.config.server.rule_path).await {
        Ok(rules) => Json(serde_json::json!({
            "total_talkgroups": rules.total_talkgroups(),
            "talkgroup_rules": rules,
        }))
        .into_response(),
        Err(e) => {
            warn!("API talkgroup list failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting tg list")
        }
    }
}

pub async fn rid_list_handler(State(state): State<AppState>) -> Response {
    let acl = match state.fne.fetch_rid_acl().await {
        Ok(acl) => acl,
        Err(e) => {
            warn!("API rid list failed: {}", e);
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting rid list");
        }
    };

    let Some(total) = acl.rids.as_ref().map(Vec::len) else {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error getting rid list");
    };

    Json(serde_json::json!({
        "total_rids": total,
        "rid_list": acl,
    }))
    .into_response()
}
