// src/handlers/auth.rs

use axum::{extract::State, Json};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{AuthResponse, LoginPayload},
};

// Handler de login: aceita nome de usuário ou e-mail no mesmo campo
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let token = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

// Com JWT a sessão é stateless: encerrar é o cliente descartar o token.
pub async fn logout(AuthenticatedUser(user): AuthenticatedUser) -> Json<Value> {
    tracing::info!("Usuário '{}' encerrou a sessão.", user.username);
    Json(json!({ "message": "Sessão encerrada com sucesso." }))
}
