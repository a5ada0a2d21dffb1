use crate::api::AppState;
use crate::api::extract::AdminUser;
use crate::api::response::ApiResponse;
use crate::core::{UserId, UserSummary};
use crate::error::{ClinicError, Result};
use crate::service::{NewUser, UserUpdate};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetPasswordRequest {
    pub new_password: Option<String>,
}

fn parse_user_id(raw: &str) -> Result<UserId> {
    UserId::parse_str(raw).map_err(|_| ClinicError::UserNotFound {
        id: raw.to_string(),
    })
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> Result<ApiResponse<Vec<UserSummary>>> {
    Ok(ApiResponse::data(state.context.users.list(&actor).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Json(request): Json<NewUser>,
) -> Result<(StatusCode, ApiResponse<UserSummary>)> {
    let user = state.context.users.create(&request, &actor).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::data(user).with_message("User created successfully"),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> Result<ApiResponse<UserSummary>> {
    let id = parse_user_id(&id)?;
    let user = state.context.users.update(&id, &update, &actor).await?;
    Ok(ApiResponse::data(user).with_message("User updated successfully"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<()>> {
    let id = parse_user_id(&id)?;
    state
        .context
        .users
        .reset_password(&id, request.new_password.as_deref().unwrap_or_default(), &actor)
        .await?;
    Ok(ApiResponse::message("User password reset successfully"))
}
