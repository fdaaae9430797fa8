//! 用户管理处理器

use crate::{
    auth::middleware::AuthenticatedPrincipal,
    error::AppError,
    middleware::AppState,
    models::user::Role,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 提升用户为管理员（需要 ROLE_ADMIN）
pub async fn promote_user(
    State(state): State<Arc<AppState>>,
    principal: AuthenticatedPrincipal,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(Role::Admin)?;

    let user = state.auth_service.promote_to_admin(&username).await?;

    tracing::info!(
        actor = %principal.username,
        target = %user.username,
        "Role promotion applied"
    );

    Ok(Json(user))
}
