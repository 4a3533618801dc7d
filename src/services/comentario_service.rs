// src/services/comentario_service.rs
use crate::{
    error::{AppError, AppResult},
    models::comentario::{AtualizarComentario, ComentarioDto, ComentarioRow, NovoComentario},
    services::colaboracao_service,
};
use chrono::Utc;
use sqlx::SqlitePool;

const SELECT_COM_AUTOR: &str = r#"
    SELECT cm.comentario_id, cm.colaboracao_id, cm.user_id, cm.assunto, cm.comentario,
           cm.created_at, u.nome_completo AS autor_nome
    FROM comentarios cm
    LEFT JOIN users u ON u.user_id = cm.user_id
"#;

fn conteudo_obrigatorio() -> AppError {
    AppError::BadRequest("O conteúdo do comentário é obrigatório.".into())
}

fn assunto_limpo(assunto: Option<&str>) -> Option<&str> {
    assunto.map(str::trim).filter(|a| !a.is_empty())
}

pub async fn find_row(db_pool: &SqlitePool, comentario_id: i64) -> AppResult<ComentarioRow> {
    sqlx::query_as::<_, ComentarioRow>(&format!("{} WHERE cm.comentario_id = ?", SELECT_COM_AUTOR))
        .bind(comentario_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Comentário não encontrado.".into()))
}

/// Comentários de uma colaboração, mais recentes primeiro.
pub async fn list_by_colaboracao(db_pool: &SqlitePool, colaboracao_id: i64) -> AppResult<Vec<ComentarioDto>> {
    let rows = sqlx::query_as::<_, ComentarioRow>(&format!(
        "{} WHERE cm.colaboracao_id = ? ORDER BY cm.created_at DESC, cm.comentario_id DESC",
        SELECT_COM_AUTOR
    ))
    .bind(colaboracao_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows.into_iter().map(ComentarioDto::from).collect())
}

pub async fn create(
    db_pool: &SqlitePool,
    colaboracao_id: i64,
    autor_id: i64,
    payload: &NovoComentario,
) -> AppResult<ComentarioDto> {
    let conteudo = payload.conteudo.trim();
    if conteudo.is_empty() {
        return Err(conteudo_obrigatorio());
    }
    if colaboracao_service::find_by_id(db_pool, colaboracao_id).await?.is_none() {
        return Err(AppError::NotFound("Colaboração não encontrada.".into()));
    }

    let result = sqlx::query(
        "INSERT INTO comentarios (colaboracao_id, user_id, assunto, comentario, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(colaboracao_id)
    .bind(autor_id)
    .bind(assunto_limpo(payload.assunto.as_deref()))
    .bind(conteudo)
    .bind(Utc::now().naive_utc())
    .execute(db_pool)
    .await?;

    tracing::info!("Comentário criado na colaboração {} por {}", colaboracao_id, autor_id);
    Ok(find_row(db_pool, result.last_insert_rowid()).await?.into())
}

pub async fn update(
    db_pool: &SqlitePool,
    comentario_id: i64,
    payload: &AtualizarComentario,
) -> AppResult<ComentarioDto> {
    let conteudo = payload.conteudo.as_deref().map(str::trim);
    if conteudo == Some("") {
        return Err(conteudo_obrigatorio());
    }

    let result = sqlx::query(
        r#"
        UPDATE comentarios SET
            assunto = COALESCE(?, assunto),
            comentario = COALESCE(?, comentario)
        WHERE comentario_id = ?
        "#,
    )
    .bind(payload.assunto.as_deref().map(str::trim))
    .bind(conteudo)
    .bind(comentario_id)
    .execute(db_pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comentário não encontrado.".into()));
    }
    Ok(find_row(db_pool, comentario_id).await?.into())
}

pub async fn delete(db_pool: &SqlitePool, comentario_id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM comentarios WHERE comentario_id = ?")
        .bind(comentario_id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comentário não encontrado.".into()));
    }
    tracing::info!("Comentário {} removido", comentario_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_pool,
        services::user_service,
        test_support::{seed_colaboracao, seed_user},
    };

    fn novo(conteudo: &str) -> NovoComentario {
        NovoComentario {
            assunto: Some("Identificação".into()),
            conteudo: conteudo.into(),
        }
    }

    #[tokio::test]
    async fn create_and_list_newest_first() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@x.com").await;
        let c = seed_colaboracao(&pool, user.user_id, "Apis mellifera").await;

        create(&pool, c.colaboracao_id, user.user_id, &novo("primeiro")).await.unwrap();
        let segundo = create(&pool, c.colaboracao_id, user.user_id, &novo("segundo")).await.unwrap();
        assert_eq!(segundo.autor.as_ref().unwrap().user_id, user.user_id);

        let lista = list_by_colaboracao(&pool, c.colaboracao_id).await.unwrap();
        assert_eq!(lista.len(), 2);
        assert_eq!(lista[0].conteudo, "segundo");
        assert!(list_by_colaboracao(&pool, 999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_content_and_unknown_collaboration() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@x.com").await;
        let c = seed_colaboracao(&pool, user.user_id, "Apis mellifera").await;

        let err = create(&pool, c.colaboracao_id, user.user_id, &novo("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = create(&pool, 999, user.user_id, &novo("ok")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_is_partial() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "a@x.com").await;
        let c = seed_colaboracao(&pool, user.user_id, "Apis mellifera").await;
        let dto = create(&pool, c.colaboracao_id, user.user_id, &novo("texto")).await.unwrap();

        let payload = AtualizarComentario {
            assunto: None,
            conteudo: Some("corrigido".into()),
        };
        let dto = update(&pool, dto.comentario_id, &payload).await.unwrap();
        assert_eq!(dto.conteudo, "corrigido");
        assert_eq!(dto.assunto.as_deref(), Some("Identificação"));

        let vazio = AtualizarComentario {
            assunto: None,
            conteudo: Some(" ".into()),
        };
        assert!(matches!(update(&pool, dto.comentario_id, &vazio).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn author_removal_keeps_comment() {
        let pool = test_pool().await;
        seed_user(&pool, "admin@x.com").await;
        let autor = seed_user(&pool, "b@x.com").await;
        let dono = seed_user(&pool, "c@x.com").await;
        let c = seed_colaboracao(&pool, dono.user_id, "Apis mellifera").await;
        let dto = create(&pool, c.colaboracao_id, autor.user_id, &novo("olá")).await.unwrap();

        user_service::delete_user(&pool, autor.user_id).await.unwrap();
        let row = find_row(&pool, dto.comentario_id).await.unwrap();
        assert!(row.user_id.is_none());
        assert!(ComentarioDto::from(row).autor.is_none());

        delete(&pool, dto.comentario_id).await.unwrap();
        assert!(matches!(delete(&pool, dto.comentario_id).await, Err(AppError::NotFound(_))));
    }
}
