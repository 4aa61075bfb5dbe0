use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{error, info};

use crate::config::FneKind;
use crate::models::{TalkgroupRule, TalkgroupRules};
use crate::services::tg_rules_service;
use crate::web::middleware::auth::CurrentUser;
use crate::web::{render, AppState, PageContext};

#[derive(Template)]
#[template(path = "tg_rules.html")]
pub struct TgRulesTemplate {
    pub page: PageContext,
    pub fne_type: &'static str,
    pub show_routing: bool,
    pub hang_time: String,
    pub rules: Vec<TalkgroupRule>,
}

#[derive(Template)]
#[template(path = "talkgroups_public.html")]
pub struct PublicTalkgroupsTemplate {
    pub page: PageContext,
    pub rules: Vec<TalkgroupRule>,
}

async fn load_rules(state: &AppState) -> Result<TalkgroupRules, Response> {
    tg_rules_service::read_rules(&state.config.server.rule_path)
        .await
        .map_err(|e| {
            error!("Reading talkgroup rules failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error reading talkgroup rules").into_response()
        })
}

/// Operator view of the full rule set. A CFNE also routes by peer, so its
/// inclusion, exclusion and preferred lists are shown.
pub async fn tg_rules_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let rules = match load_rules(&state).await {
        Ok(rules) => rules,
        Err(response) => return response,
    };

    let kind = state.config.server.fne_type;
    render(&TgRulesTemplate {
        page: PageContext::new(&state, &current),
        fne_type: kind.label(),
        show_routing: kind == FneKind::Cfne,
        hang_time: rules
            .group_hang_time
            .map(|t| t.to_string())
            .unwrap_or_default(),
        rules: rules.group_voice,
    })
}

/// Public list of active talkgroups.
pub async fn public_talkgroups_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let rules = match load_rules(&state).await {
        Ok(rules) => rules,
        Err(response) => return response,
    };

    render(&PublicTalkgroupsTemplate {
        page: PageContext::new(&state, &current),
        rules: rules
            .group_voice
            .into_iter()
            .filter(|r| r.config.active)
            .collect(),
    })
}

pub async fn write_rules_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(rules): Json<TalkgroupRules>,
) -> Response {
    let who = current.0.map(|u| u.username).unwrap_or_default();
    match tg_rules_service::write_rules(&state.config.server.rule_path, &rules).await {
        Ok(()) => {
            info!(user = %who, talkgroups = rules.total_talkgroups(), "Talkgroup rules updated");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            error!("Writing talkgroup rules failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error writing talkgroup rules").into_response()
        }
    }
}
