// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{AtualizarSenha, AtualizarTipo, AtualizarUsuario, Claims, EmailQuery, NovoUsuario},
    services::{imagem_service, user_service},
    state::AppState,
    web::{auth_handlers, mw_auth::ensure_owner_or_admin},
};
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

fn nao_encontrado() -> AppError {
    AppError::NotFound("Usuário não encontrado.".into())
}

// POST /users (pública; o `tipo` enviado é ignorado)
pub async fn handle_create_user(
    State(state): State<AppState>,
    payload: Result<Json<NovoUsuario>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let user = auth_handlers::registar(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// GET /users
pub async fn handle_list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let users = user_service::find_all_users(&state.db_pool).await?;
    tracing::debug!("GET /users: {} utilizadores", users.len());
    Ok(Json(users))
}

// GET /users/{id}
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::find_user_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(nao_encontrado)?;
    Ok(Json(user))
}

// GET /user/email?email=...
pub async fn handle_get_user_by_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> AppResult<impl IntoResponse> {
    let email = query.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(AppError::BadRequest("E-mail é obrigatório.".into()));
    }
    let user = user_service::find_user_by_email(&state.db_pool, email)
        .await?
        .ok_or_else(nao_encontrado)?;
    Ok(Json(user))
}

// PUT /users_update/{id}
pub async fn handle_update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarUsuario>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    ensure_owner_or_admin(&claims, id)?;
    let Json(payload) = payload?;
    payload.validate()?;

    let user = user_service::update_user(&state.db_pool, id, &payload).await?;
    Ok(Json(user))
}

// PUT /users/{id}/tipo (admin)
pub async fn handle_update_tipo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarTipo>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let user = user_service::set_user_tipo(&state.db_pool, id, payload.tipo).await?;
    Ok(Json(user))
}

// PUT /users/{id}/senha
pub async fn handle_update_senha(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarSenha>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    ensure_owner_or_admin(&claims, id)?;
    let Json(payload) = payload?;
    if payload.senha_atual.is_empty() || payload.nova_senha.is_empty() {
        return Err(AppError::BadRequest("Faltaram dados para atualizar a senha.".into()));
    }
    payload.validate()?;

    user_service::change_password(&state.db_pool, id, &payload.senha_atual, &payload.nova_senha)
        .await?;
    let user = user_service::find_user_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(nao_encontrado)?;
    Ok(Json(json!({ "message": "Senha atualizada com sucesso.", "user": user })))
}

// DELETE /user_delete/{id}
pub async fn handle_delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    ensure_owner_or_admin(&claims, id)?;
    let user = user_service::find_user_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(nao_encontrado)?;

    let urls = imagem_service::urls_by_user(&state.db_pool, id).await?;
    imagem_service::destroy_hosted(state.image_host.as_ref(), &urls).await;

    user_service::delete_user(&state.db_pool, id).await?;
    tracing::info!("Utilizador {} removido por {}", id, claims.user_id);
    Ok(Json(json!({ "message": "Usuário deletado com sucesso.", "user": user })))
}
