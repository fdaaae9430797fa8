//! 认证相关的 HTTP 处理器

use super::json::ApiJson;
use crate::{
    auth::middleware::AuthenticatedPrincipal, error::AppError, middleware::AppState,
    models::auth::*,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// 刷新令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.refresh(req).await?;

    Ok(Json(response))
}

/// 获取当前用户信息
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.current_user(&principal.username).await?;

    Ok(Json(user))
}

/// 登出（客户端丢弃令牌）
pub async fn logout(
    State(state): State<Arc<AppState>>,
    principal: AuthenticatedPrincipal,
) -> impl IntoResponse {
    state.auth_service.logout(&principal);

    Json(json!({"message": "Logged out successfully"}))
}
