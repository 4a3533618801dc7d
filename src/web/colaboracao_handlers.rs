// src/web/colaboracao_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        colaboracao::{
            AtualizarColaboracao, AtualizarStatusColaboracao, FiltrosColaboracao, ListaQuery,
            NovaColaboracao,
        },
        user::Claims,
    },
    services::colaboracao_service,
    state::AppState,
    web::mw_auth::ensure_owner_or_admin,
};
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

fn nao_encontrada() -> AppError {
    AppError::NotFound("Colaboração não encontrada.".into())
}

// POST /colaboracoes/{user_id}
pub async fn handle_create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    payload: Result<Json<NovaColaboracao>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    ensure_owner_or_admin(&claims, user_id)?;
    let Json(payload) = payload?;
    payload.validate()?;

    let colaboracao = colaboracao_service::create(&state.db_pool, user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(colaboracao)))
}

// GET /colaboracoes?user_id=
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ListaQuery>,
) -> AppResult<impl IntoResponse> {
    let lista = colaboracao_service::list(&state.db_pool, query.user_id).await?;
    Ok(Json(lista))
}

// GET /colaboracoes/{id}
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(colaboracao_service::find_detalhe(&state.db_pool, id).await?))
}

// PUT /colaboracoes/{id}
pub async fn handle_update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarColaboracao>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let atual = colaboracao_service::find_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(nao_encontrada)?;
    ensure_owner_or_admin(&claims, atual.user_id)?;

    let Json(payload) = payload?;
    if payload.status.is_some() && !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Apenas administradores podem alterar o status.".into(),
        ));
    }
    payload.validate()?;

    let detalhe = colaboracao_service::update(&state.db_pool, id, &payload).await?;
    Ok(Json(detalhe))
}

// PUT /colaboracoes/{id}/status (admin)
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarStatusColaboracao>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let detalhe = colaboracao_service::update_status(&state.db_pool, id, payload.status).await?;
    Ok(Json(detalhe))
}

// DELETE /colaboracoes/{id}
pub async fn handle_delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let atual = colaboracao_service::find_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(nao_encontrada)?;
    ensure_owner_or_admin(&claims, atual.user_id)?;

    colaboracao_service::delete(&state.db_pool, state.image_host.as_ref(), id).await?;
    Ok(Json(json!({ "message": "Colaboração deletada com sucesso." })))
}

// GET /colaboracoes/especie/{nome}
pub async fn handle_by_especie(
    State(state): State<AppState>,
    Path(nome): Path<String>,
) -> AppResult<impl IntoResponse> {
    let lista = colaboracao_service::find_by_especie(&state.db_pool, nome.trim()).await?;
    Ok(Json(lista))
}

// GET /colaboracoes/usuario/{user_id}
pub async fn handle_by_usuario(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let lista = colaboracao_service::find_by_user(&state.db_pool, user_id).await?;
    Ok(Json(lista))
}

// POST /colaboracoes-filtros
pub async fn handle_filtros(
    State(state): State<AppState>,
    payload: Result<Json<FiltrosColaboracao>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(filtros) = payload?;
    let lista = colaboracao_service::filtrar(&state.db_pool, &filtros).await?;
    Ok(Json(lista))
}
