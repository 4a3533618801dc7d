// src/web/imagem_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        imagem::{AtualizarImagem, AtualizarStatusImagem, ImagemCriada},
        user::Claims,
    },
    services::{colaboracao_service, image_host::PASTA_COLABORACOES, imagem_service},
    state::AppState,
    web::mw_auth::ensure_owner_or_admin,
};
use axum::{
    extract::{rejection::JsonRejection, Extension, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

/// Tamanho máximo aceite no upload (10 MB).
pub const LIMITE_UPLOAD: usize = 10 * 1024 * 1024;
/// Comprimento máximo do código guardado, já com o prefixo dono + colaboração.
const CODIGO_IMAGEM_MAXIMO: usize = 255;

// Campos lidos do formulário multipart
#[derive(Default)]
struct FormularioUpload {
    ficheiro: Option<(Vec<u8>, String)>,
    codigo_imagem: Option<String>,
    descricao: Option<String>,
}

async fn ler_formulario(mut multipart: Multipart) -> AppResult<FormularioUpload> {
    let mut form = FormularioUpload::default();
    while let Some(field) = multipart.next_field().await? {
        let nome = field.name().unwrap_or_default().to_string();
        match nome.as_str() {
            "imagem" => {
                let mime = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                form.ficheiro = Some((bytes.to_vec(), mime));
            }
            "codigo_imagem" => form.codigo_imagem = Some(field.text().await?),
            "descricao" => form.descricao = Some(field.text().await?),
            outro => tracing::debug!("Upload: campo '{}' ignorado", outro),
        }
    }
    Ok(form)
}

// GET /imagens
pub async fn handle_list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(imagem_service::find_all(&state.db_pool).await?))
}

// GET /imagens/{id}
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let imagem = imagem_service::find_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Imagem não encontrada.".into()))?;
    Ok(Json(imagem))
}

// GET /imagens/colaboracao/{id}
pub async fn handle_by_colaboracao(
    State(state): State<AppState>,
    Path(colaboracao_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(imagem_service::find_by_colaboracao(&state.db_pool, colaboracao_id).await?))
}

// GET /imagens/codigo/{codigo}
pub async fn handle_by_codigo(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(imagem_service::find_by_codigo(&state.db_pool, &codigo).await?))
}

// POST /imagens/{colaboracao_id}/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(colaboracao_id): Path<i64>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = ler_formulario(multipart).await?;

    let (bytes, mime) = form
        .ficheiro
        .filter(|(bytes, _)| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("Arquivo de imagem não fornecido.".into()))?;
    if !mime.starts_with("image/") {
        return Err(AppError::BadRequest("Apenas arquivos de imagem são permitidos.".into()));
    }
    let codigo = form.codigo_imagem.as_deref().map(str::trim).unwrap_or_default();
    if codigo.is_empty() {
        return Err(AppError::BadRequest("Código da imagem é obrigatório.".into()));
    }

    let colaboracao = colaboracao_service::find_by_id(&state.db_pool, colaboracao_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Colaboração não encontrada.".into()))?;
    ensure_owner_or_admin(&claims, colaboracao.user_id)?;

    // Código final: dono + colaboração + código enviado pelo front
    let codigo_final = format!("{}{}{}", colaboracao.user_id, colaboracao_id, codigo);
    if codigo_final.chars().count() > CODIGO_IMAGEM_MAXIMO {
        return Err(AppError::BadRequest("Código da imagem é longo demais.".into()));
    }

    let public_id = format!("{}_{}_{}", colaboracao_id, codigo, Utc::now().timestamp_millis());
    let hospedada = state
        .image_host
        .upload(bytes, &mime, PASTA_COLABORACOES, &public_id)
        .await?;
    tracing::info!("Upload concluído: {}", hospedada.public_id);

    let descricao = form.descricao.unwrap_or_default();
    let imagem = match imagem_service::insert(
        &state.db_pool,
        colaboracao_id,
        &codigo_final,
        &hospedada.secure_url,
        descricao.trim(),
    )
    .await
    {
        Ok(imagem) => imagem,
        Err(e) => {
            // Não deixa o ficheiro órfão no serviço externo
            if let Err(destroy_err) = state.image_host.destroy(&hospedada.public_id).await {
                tracing::error!("Falha ao remover '{}': {}", hospedada.public_id, destroy_err);
            }
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(ImagemCriada {
            success: true,
            message: "Imagem criada com sucesso".into(),
            imagem,
        }),
    ))
}

// PUT /imagens/{id}
pub async fn handle_update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarImagem>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let atual = imagem_service::find_with_owner(&state.db_pool, id).await?;
    ensure_owner_or_admin(&claims, atual.dono_id)?;

    let Json(payload) = payload?;
    payload.validate()?;
    Ok(Json(imagem_service::update(&state.db_pool, id, &payload).await?))
}

// PUT /imagens/status/{id} (admin)
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AtualizarStatusImagem>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    Ok(Json(imagem_service::update_status(&state.db_pool, id, payload.status).await?))
}

// DELETE /imagens/{id}
pub async fn handle_delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let atual = imagem_service::find_with_owner(&state.db_pool, id).await?;
    ensure_owner_or_admin(&claims, atual.dono_id)?;

    imagem_service::delete(&state.db_pool, state.image_host.as_ref(), &atual.imagem).await?;
    Ok(Json(json!({ "message": "Imagem deletada com sucesso." })))
}
