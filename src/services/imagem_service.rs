// src/services/imagem_service.rs
use crate::{
    error::{AppError, AppResult},
    models::imagem::{AtualizarImagem, Imagem, ImagemComDono, StatusImagem},
    services::image_host::{self, ImageHost},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

fn nao_encontrada() -> AppError {
    AppError::NotFound("Imagem não encontrada.".into())
}

pub async fn find_all(db_pool: &SqlitePool) -> AppResult<Vec<Imagem>> {
    tracing::debug!("Listando todas as imagens");
    let imagens = sqlx::query_as::<_, Imagem>("SELECT * FROM imagens ORDER BY imagem_id ASC")
        .fetch_all(db_pool)
        .await?;
    Ok(imagens)
}

pub async fn find_by_id(db_pool: &SqlitePool, imagem_id: i64) -> AppResult<Option<Imagem>> {
    let imagem = sqlx::query_as::<_, Imagem>("SELECT * FROM imagens WHERE imagem_id = ?")
        .bind(imagem_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(imagem)
}

/// Imagem e o dono da colaboração a que pertence.
pub async fn find_with_owner(db_pool: &SqlitePool, imagem_id: i64) -> AppResult<ImagemComDono> {
    sqlx::query_as::<_, ImagemComDono>(
        r#"
        SELECT i.*, c.user_id AS dono_id
        FROM imagens i
        JOIN colaboracoes c ON c.colaboracao_id = i.colaboracao_id
        WHERE i.imagem_id = ?
        "#,
    )
    .bind(imagem_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(nao_encontrada)
}

pub async fn find_by_colaboracao(db_pool: &SqlitePool, colaboracao_id: i64) -> AppResult<Vec<Imagem>> {
    let imagens = sqlx::query_as::<_, Imagem>(
        "SELECT * FROM imagens WHERE colaboracao_id = ? ORDER BY imagem_id ASC",
    )
    .bind(colaboracao_id)
    .fetch_all(db_pool)
    .await?;
    Ok(imagens)
}

pub async fn find_by_codigo(db_pool: &SqlitePool, codigo: &str) -> AppResult<Imagem> {
    sqlx::query_as::<_, Imagem>("SELECT * FROM imagens WHERE codigo_imagem = ?")
        .bind(codigo.trim())
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(nao_encontrada)
}

/// Imagens de várias colaborações de uma vez, agrupadas por colaboração.
/// Com `apenas_aprovadas`, ficam só as `Aprovada` (ou sem status).
pub async fn find_by_colaboracoes(
    db_pool: &SqlitePool,
    ids: &[i64],
    apenas_aprovadas: bool,
) -> AppResult<HashMap<i64, Vec<Imagem>>> {
    let mut agrupadas: HashMap<i64, Vec<Imagem>> = HashMap::new();
    if ids.is_empty() {
        return Ok(agrupadas);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM imagens WHERE colaboracao_id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
    if apenas_aprovadas {
        qb.push(" AND (status = 'Aprovada' OR status IS NULL)");
    }
    qb.push(" ORDER BY imagem_id ASC");

    for imagem in qb.build_query_as::<Imagem>().fetch_all(db_pool).await? {
        agrupadas.entry(imagem.colaboracao_id).or_default().push(imagem);
    }
    Ok(agrupadas)
}

pub async fn insert(
    db_pool: &SqlitePool,
    colaboracao_id: i64,
    codigo_imagem: &str,
    url_imagem: &str,
    descricao: &str,
) -> AppResult<Imagem> {
    let result = sqlx::query(
        "INSERT INTO imagens (colaboracao_id, codigo_imagem, url_imagem, descricao) VALUES (?, ?, ?, ?)",
    )
    .bind(colaboracao_id)
    .bind(codigo_imagem)
    .bind(url_imagem)
    .bind(descricao)
    .execute(db_pool)
    .await?;

    tracing::info!("Imagem '{}' registada na colaboração {}", codigo_imagem, colaboracao_id);
    find_by_id(db_pool, result.last_insert_rowid())
        .await?
        .ok_or(AppError::InternalServerError)
}

pub async fn update(db_pool: &SqlitePool, imagem_id: i64, payload: &AtualizarImagem) -> AppResult<Imagem> {
    let result = sqlx::query(
        r#"
        UPDATE imagens SET
            codigo_imagem = COALESCE(?, codigo_imagem),
            descricao = COALESCE(?, descricao)
        WHERE imagem_id = ?
        "#,
    )
    .bind(payload.codigo_imagem.as_deref().map(str::trim))
    .bind(payload.descricao.as_deref())
    .bind(imagem_id)
    .execute(db_pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(nao_encontrada());
    }
    find_by_id(db_pool, imagem_id).await?.ok_or_else(nao_encontrada)
}

pub async fn update_status(db_pool: &SqlitePool, imagem_id: i64, status: StatusImagem) -> AppResult<Imagem> {
    let result = sqlx::query("UPDATE imagens SET status = ? WHERE imagem_id = ?")
        .bind(status)
        .bind(imagem_id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(nao_encontrada());
    }
    tracing::info!("Imagem {} marcada como {}", imagem_id, status.as_str());
    find_by_id(db_pool, imagem_id).await?.ok_or_else(nao_encontrada)
}

/// Remove o ficheiro hospedado e depois a linha.
pub async fn delete(db_pool: &SqlitePool, host: &dyn ImageHost, imagem: &Imagem) -> AppResult<()> {
    destroy_hosted(host, std::slice::from_ref(&imagem.url_imagem)).await;
    sqlx::query("DELETE FROM imagens WHERE imagem_id = ?")
        .bind(imagem.imagem_id)
        .execute(db_pool)
        .await?;
    tracing::info!("Imagem {} removida", imagem.imagem_id);
    Ok(())
}

/// URLs das imagens de todas as colaborações de um utilizador.
pub async fn urls_by_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<Vec<String>> {
    let urls = sqlx::query_scalar::<_, String>(
        r#"
        SELECT i.url_imagem
        FROM imagens i
        JOIN colaboracoes c ON c.colaboracao_id = i.colaboracao_id
        WHERE c.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;
    Ok(urls)
}

/// Apaga os ficheiros no serviço de imagens. Falhas só ficam no log.
pub async fn destroy_hosted(host: &dyn ImageHost, urls: &[String]) {
    for url in urls {
        let Some(public_id) = image_host::public_id_from_url(url) else {
            tracing::warn!("Não foi possível extrair o public id de '{}'", url);
            continue;
        };
        if let Err(e) = host.destroy(&public_id).await {
            tracing::error!("Erro ao remover '{}' do serviço de imagens: {:?}", public_id, e);
        }
    }
}
