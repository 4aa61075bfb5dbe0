use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::UserError;
use crate::services::user_service::{self, UserListItem};
use crate::web::middleware::auth::CurrentUser;
use crate::web::{notice_redirect, render, AppState, PageContext};

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub page: PageContext,
    pub users: Vec<UserListItem>,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UsersQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddUserForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EditUserForm {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserForm {
    pub id: i64,
}

pub async fn list_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<UsersQuery>,
) -> Response {
    match user_service::list_users(&state.pool).await {
        Ok(users) => render(&UsersTemplate {
            page: PageContext::new(&state, &current),
            users,
            error: query.error,
            success: query.success,
        }),
        Err(e) => {
            error!("Listing users failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving users").into_response()
        }
    }
}

pub async fn add_handler(State(state): State<AppState>, Form(form): Form<AddUserForm>) -> Response {
    let target = match user_service::create_user(&state.pool, &form.username, &form.password).await {
        Ok(id) => {
            info!(id, user = %form.username.trim(), "Console user added");
            notice_redirect("/users", "success", "User added successfully")
        }
        Err(e) => user_error_redirect("Error adding user", e),
    };
    Redirect::to(&target).into_response()
}

pub async fn edit_handler(State(state): State<AppState>, Form(form): Form<EditUserForm>) -> Response {
    let target = match user_service::edit_user(&state.pool, form.id, &form.username, &form.password).await {
        Ok(()) => notice_redirect("/users", "success", "User edited successfully"),
        Err(e) => user_error_redirect("Error editing user", e),
    };
    Redirect::to(&target).into_response()
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<DeleteUserForm>,
) -> Response {
    if current.0.as_ref().map(|u| u.id) == Some(form.id) {
        return Redirect::to(&notice_redirect("/users", "error", "You cannot delete yourself"))
            .into_response();
    }

    let target = match user_service::delete_user(&state.pool, form.id).await {
        Ok(()) => notice_redirect("/users", "success", "User deleted"),
        Err(e) => user_error_redirect("Error deleting user", e),
    };
    Redirect::to(&target).into_response()
}

fn user_error_redirect(fallback: &str, err: UserError) -> String {
    match err {
        UserError::AlreadyExists | UserError::Invalid(_) => {
            notice_redirect("/users", "error", &err.to_string())
        }
        other => {
            error!("{}: {}", fallback, other);
            notice_redirect("/users", "error", fallback)
        }
    }
}
