// src/web/comentario_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        comentario::{AtualizarComentario, ComentarioDto, ComentarioRow, NovoComentario},
        user::Claims,
    },
    services::comentario_service,
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

// Autor do comentário ou admin. Comentários sem autor só o admin mexe.
fn pode_alterar(claims: &Claims, row: &ComentarioRow) -> AppResult {
    match row.user_id {
        Some(autor) if claims.can_act_on(autor) => Ok(()),
        None if claims.is_admin() => Ok(()),
        _ => Err(AppError::Forbidden(
            "Apenas o autor ou um administrador pode alterar este comentário.".into(),
        )),
    }
}

// GET /colaboracoes/{id}/comentarios
pub async fn handle_list(
    State(state): State<AppState>,
    Path(colaboracao_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let comentarios = comentario_service::list_by_colaboracao(&state.db_pool, colaboracao_id).await?;
    Ok(Json(comentarios))
}

// POST /colaboracoes/{id}/comentarios
pub async fn handle_create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(colaboracao_id): Path<i64>,
    payload: Result<Json<NovoComentario>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;

    let dto = comentario_service::create(&state.db_pool, colaboracao_id, claims.user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

// GET /comentarios/{id}
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let row = comentario_service::find_row(&state.db_pool, id).await?;
    Ok(Json(ComentarioDto::from(row)))
}

// PATCH /comentarios/{id}
pub async fn handle_update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarComentario>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let row = comentario_service::find_row(&state.db_pool, id).await?;
    pode_alterar(&claims, &row)?;

    let Json(payload) = payload?;
    payload.validate()?;
    Ok(Json(comentario_service::update(&state.db_pool, id, &payload).await?))
}

// DELETE /comentarios/{id}
pub async fn handle_delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let row = comentario_service::find_row(&state.db_pool, id).await?;
    pode_alterar(&claims, &row)?;

    comentario_service::delete(&state.db_pool, id).await?;
    Ok(Json(json!({ "message": "Comentário removido com sucesso." })))
}
