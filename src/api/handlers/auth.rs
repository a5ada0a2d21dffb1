use crate::api::AppState;
use crate::api::extract::{AuthUser, BearerToken};
use crate::api::response::ApiResponse;
use crate::error::Result;
use crate::service::LoginResponse;
use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    let response = state
        .context
        .auth
        .login(
            request.username.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(ApiResponse::data(response).with_message("Login successful"))
}

pub async fn verify(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<ApiResponse<Value>> {
    let user = state.context.auth.verify(&token).await?;
    Ok(ApiResponse::data(json!({ "user": user })))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>> {
    state
        .context
        .auth
        .change_password(
            &actor,
            request.current_password.as_deref().unwrap_or_default(),
            request.new_password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(ApiResponse::message("Password updated successfully"))
}
