// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{DiretorResumo, RegisterUserPayload, UpdateUserPayload, User},
};

// POST /register — criação de conta, restrita a admin
pub async fn register(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(&["admin"])?;
    payload.validate().map_err(AppError::ValidationError)?;

    let novo = app_state.user_service.register_user(&user.0, payload).await?;

    Ok((StatusCode::CREATED, Json(novo)))
}

// GET /users_api
pub async fn list_users(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<User>>, AppError> {
    user.require_role(&["admin"])?;

    let users = app_state.user_service.list_users().await?;
    Ok(Json(users))
}

// GET /users/diretores_api — alimenta o seletor de diretor no cadastro
pub async fn list_diretores(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<DiretorResumo>>, AppError> {
    user.require_role(&["admin"])?;

    let diretores = app_state.user_service.list_diretores().await?;
    Ok(Json(diretores))
}

// PATCH /users/{id}
pub async fn update_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    user.require_role(&["admin"])?;

    // Senha em branco no formulário significa "não alterar".
    if payload.password.as_deref() == Some("") {
        payload.password = None;
    }
    payload.validate().map_err(AppError::ValidationError)?;

    let atualizado = app_state
        .user_service
        .update_user(&user.0, id, payload)
        .await?;

    Ok(Json(atualizado))
}

// DELETE /users/{id}
pub async fn delete_user(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require_role(&["admin"])?;

    app_state.user_service.delete_user(&user.0, id).await?;

    Ok(Json(json!({ "message": "Usuário removido com sucesso!" })))
}
