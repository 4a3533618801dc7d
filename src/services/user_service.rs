// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{AtualizarUsuario, NovoUsuario, TipoUsuario, User},
    services::auth_service,
};
use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

const EMAIL_EM_USO: &str = "E-mail já está em uso.";

/// Dados de verificação de e-mail gravados junto com uma conta inativa.
#[derive(Debug, Clone)]
pub struct VerificacaoPendente {
    pub token: String,
    pub expira_em: NaiveDateTime,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().is_some_and(|d| d.is_unique_violation())
}

/// Cria um utilizador. O primeiro registo da base torna-se `Admin`, os restantes `Comum`.
pub async fn create_user(
    db_pool: &SqlitePool,
    payload: &NovoUsuario,
    verificacao: Option<VerificacaoPendente>,
) -> AppResult<User> {
    let email = payload.email.trim().to_string();
    if find_user_by_email(db_pool, &email).await?.is_some() {
        return Err(AppError::BadRequest(EMAIL_EM_USO.into()));
    }

    let senha_hash = auth_service::hash_password(&payload.senha).await?;
    let agora = Utc::now().naive_utc();
    let ativo = verificacao.is_none();
    let (token, expira_em) = match verificacao {
        Some(v) => (Some(v.token), Some(v.expira_em)),
        None => (None, None),
    };

    let mut tx = db_pool.begin().await?;

    let existentes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;
    let tipo = if existentes == 0 {
        tracing::info!("Primeiro utilizador da base, criado como Admin: {}", email);
        TipoUsuario::Admin
    } else {
        TipoUsuario::Comum
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (
            tipo, nome_completo, telefone, whatsapp, email, instituicao, curso,
            nivel_academico, link_lattes, senha, ativo,
            email_verification_token, email_verification_expires, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(tipo)
    .bind(payload.nome_completo.trim())
    .bind(payload.telefone)
    .bind(payload.whatsapp)
    .bind(&email)
    .bind(payload.instituicao.as_deref().unwrap_or_default())
    .bind(payload.curso.as_deref().unwrap_or_default())
    .bind(payload.nivel_academico.as_deref().unwrap_or_default())
    .bind(payload.link_lattes.as_deref().unwrap_or_default())
    .bind(&senha_hash)
    .bind(ativo)
    .bind(token)
    .bind(expira_em)
    .bind(agora)
    .bind(agora)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest(EMAIL_EM_USO.into())
        } else {
            AppError::from(e)
        }
    })?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
        .bind(inserted.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Utilizador {} criado (id {}, tipo {:?})", user.email, user.user_id, user.tipo);
    Ok(user)
}

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por e-mail: {}", email);
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email.trim())
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn find_all_users(db_pool: &SqlitePool) -> AppResult<Vec<User>> {
    tracing::debug!("Buscando todos os utilizadores...");
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY user_id ASC")
        .fetch_all(db_pool)
        .await?;
    Ok(users)
}

/// Atualização parcial do perfil. Senha e tipo têm rotas próprias.
pub async fn update_user(
    db_pool: &SqlitePool,
    user_id: i64,
    payload: &AtualizarUsuario,
) -> AppResult<User> {
    let atual = find_user_by_id(db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".into()))?;

    if let Some(email) = payload.email.as_deref().map(str::trim) {
        if email != atual.email {
            if let Some(outro) = find_user_by_email(db_pool, email).await? {
                if outro.user_id != user_id {
                    return Err(AppError::BadRequest(EMAIL_EM_USO.into()));
                }
            }
        }
    }

    sqlx::query(
        r#"
        UPDATE users SET
            nome_completo = COALESCE(?, nome_completo),
            telefone = COALESCE(?, telefone),
            whatsapp = COALESCE(?, whatsapp),
            email = COALESCE(?, email),
            instituicao = COALESCE(?, instituicao),
            curso = COALESCE(?, curso),
            nivel_academico = COALESCE(?, nivel_academico),
            link_lattes = COALESCE(?, link_lattes),
            updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(payload.nome_completo.as_deref().map(str::trim))
    .bind(payload.telefone)
    .bind(payload.whatsapp)
    .bind(payload.email.as_deref().map(str::trim))
    .bind(payload.instituicao.as_deref())
    .bind(payload.curso.as_deref())
    .bind(payload.nivel_academico.as_deref())
    .bind(payload.link_lattes.as_deref())
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(db_pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest(EMAIL_EM_USO.into())
        } else {
            AppError::from(e)
        }
    })?;

    tracing::info!("Perfil do utilizador {} atualizado", user_id);
    find_user_by_id(db_pool, user_id)
        .await?
        .ok_or(AppError::InternalServerError)
}

pub async fn set_user_tipo(db_pool: &SqlitePool, user_id: i64, tipo: TipoUsuario) -> AppResult<User> {
    let result = sqlx::query("UPDATE users SET tipo = ?, updated_at = ? WHERE user_id = ?")
        .bind(tipo)
        .bind(Utc::now().naive_utc())
        .bind(user_id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Usuário não encontrado.".into()));
    }
    tracing::info!("Tipo do utilizador {} alterado para {}", user_id, tipo.as_str());
    find_user_by_id(db_pool, user_id)
        .await?
        .ok_or(AppError::InternalServerError)
}

/// Promove `Comum` a `Colaborador`. Outros tipos não mudam.
pub async fn promote_if_comum(db_pool: &SqlitePool, user_id: i64) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE users SET tipo = 'Colaborador', updated_at = ? WHERE user_id = ? AND tipo = 'Comum'",
    )
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(db_pool)
    .await?;

    let promovido = result.rows_affected() > 0;
    if promovido {
        tracing::info!("Utilizador {} promovido a Colaborador", user_id);
    }
    Ok(promovido)
}

/// Troca de senha com verificação da senha atual.
pub async fn change_password(
    db_pool: &SqlitePool,
    user_id: i64,
    senha_atual: &str,
    nova_senha: &str,
) -> AppResult<()> {
    let user = find_user_by_id(db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado.".into()))?;

    if !auth_service::verify_password(senha_atual, &user.senha).await? {
        return Err(AppError::BadRequest("Senha atual incorreta.".into()));
    }

    store_password(db_pool, user_id, nova_senha).await
}

async fn store_password(db_pool: &SqlitePool, user_id: i64, nova_senha: &str) -> AppResult<()> {
    let hash = auth_service::hash_password(nova_senha).await?;
    sqlx::query(
        r#"
        UPDATE users SET
            senha = ?, reset_token = NULL, reset_token_expiration = NULL, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(hash)
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(db_pool)
    .await?;
    tracing::info!("Senha do utilizador {} atualizada", user_id);
    Ok(())
}

pub async fn delete_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
        .bind(user_id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Usuário não encontrado.".into()));
    }
    tracing::info!("Utilizador {} removido", user_id);
    Ok(())
}

// --- Recuperação de senha ---

pub async fn set_reset_token(
    db_pool: &SqlitePool,
    user_id: i64,
    token: &str,
    expira_em: NaiveDateTime,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE users SET reset_token = ?, reset_token_expiration = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(token)
    .bind(expira_em)
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(db_pool)
    .await?;
    Ok(())
}

/// Aplica a nova senha de um pedido de recuperação.
pub async fn reset_password_with_token(
    db_pool: &SqlitePool,
    token: &str,
    nova_senha: &str,
) -> AppResult<()> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE reset_token = ?")
        .bind(token)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Token inválido.".into()))?;

    let expirado = user
        .reset_token_expiration
        .is_none_or(|expira| expira < Utc::now().naive_utc());
    if expirado {
        return Err(AppError::BadRequest("Token expirado.".into()));
    }

    store_password(db_pool, user.user_id, nova_senha).await
}

// --- Verificação de e-mail ---

pub async fn verify_email(db_pool: &SqlitePool, token: &str) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email_verification_token = ?")
        .bind(token)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Token de verificação inválido.".into()))?;

    let expirado = user
        .email_verification_expires
        .is_none_or(|expira| expira < Utc::now().naive_utc());
    if expirado {
        return Err(AppError::BadRequest("Token de verificação expirado.".into()));
    }

    sqlx::query(
        r#"
        UPDATE users SET
            ativo = 1, email_verification_token = NULL, email_verification_expires = NULL, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(Utc::now().naive_utc())
    .bind(user.user_id)
    .execute(db_pool)
    .await?;

    tracing::info!("E-mail verificado para o utilizador {}", user.user_id);
    find_user_by_id(db_pool, user.user_id)
        .await?
        .ok_or(AppError::InternalServerError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;

    fn novo(email: &str) -> NovoUsuario {
        NovoUsuario {
            nome_completo: "Teste".into(),
            email: email.into(),
            senha: "senha-segura".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_user_is_admin_then_comum() {
        let pool = test_pool().await;
        let primeiro = create_user(&pool, &novo("a@x.com"), None).await.unwrap();
        let segundo = create_user(&pool, &novo("b@x.com"), None).await.unwrap();
        assert_eq!(primeiro.tipo, TipoUsuario::Admin);
        assert_eq!(segundo.tipo, TipoUsuario::Comum);
        assert!(segundo.ativo);
        assert_ne!(segundo.senha, "senha-segura");
    }

    #[tokio::test]
    async fn duplicate_email_is_bad_request() {
        let pool = test_pool().await;
        create_user(&pool, &novo("a@x.com"), None).await.unwrap();
        let err = create_user(&pool, &novo("a@x.com"), None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == EMAIL_EM_USO));
    }

    #[tokio::test]
    async fn promotion_only_touches_comum() {
        let pool = test_pool().await;
        let admin = create_user(&pool, &novo("a@x.com"), None).await.unwrap();
        let comum = create_user(&pool, &novo("b@x.com"), None).await.unwrap();

        assert!(!promote_if_comum(&pool, admin.user_id).await.unwrap());
        assert!(promote_if_comum(&pool, comum.user_id).await.unwrap());
        assert!(!promote_if_comum(&pool, comum.user_id).await.unwrap());

        let admin = find_user_by_id(&pool, admin.user_id).await.unwrap().unwrap();
        let comum = find_user_by_id(&pool, comum.user_id).await.unwrap().unwrap();
        assert_eq!(admin.tipo, TipoUsuario::Admin);
        assert_eq!(comum.tipo, TipoUsuario::Colaborador);
    }

    #[tokio::test]
    async fn change_password_checks_current() {
        let pool = test_pool().await;
        let user = create_user(&pool, &novo("a@x.com"), None).await.unwrap();

        let err = change_password(&pool, user.user_id, "errada", "nova-senha-1").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        change_password(&pool, user.user_id, "senha-segura", "nova-senha-1").await.unwrap();
        let user = find_user_by_id(&pool, user.user_id).await.unwrap().unwrap();
        assert!(auth_service::verify_password("nova-senha-1", &user.senha).await.unwrap());
    }

    #[tokio::test]
    async fn reset_token_flow() {
        let pool = test_pool().await;
        let user = create_user(&pool, &novo("a@x.com"), None).await.unwrap();

        let vencido = Utc::now().naive_utc() - Duration::minutes(1);
        set_reset_token(&pool, user.user_id, "tok-velho", vencido).await.unwrap();
        let err = reset_password_with_token(&pool, "tok-velho", "outra-senha").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let valido = Utc::now().naive_utc() + Duration::hours(1);
        set_reset_token(&pool, user.user_id, "tok", valido).await.unwrap();
        reset_password_with_token(&pool, "tok", "outra-senha").await.unwrap();

        let user = find_user_by_id(&pool, user.user_id).await.unwrap().unwrap();
        assert!(user.reset_token.is_none());
        let err = reset_password_with_token(&pool, "tok", "x").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn pending_verification_activates_account() {
        let pool = test_pool().await;
        let verificacao = VerificacaoPendente {
            token: "verif".into(),
            expira_em: Utc::now().naive_utc() + Duration::hours(24),
        };
        let user = create_user(&pool, &novo("a@x.com"), Some(verificacao)).await.unwrap();
        assert!(!user.ativo);

        let user = verify_email(&pool, "verif").await.unwrap();
        assert!(user.ativo);
        assert!(user.email_verification_token.is_none());
    }

    #[tokio::test]
    async fn update_rejects_email_of_other_user() {
        let pool = test_pool().await;
        create_user(&pool, &novo("a@x.com"), None).await.unwrap();
        let b = create_user(&pool, &novo("b@x.com"), None).await.unwrap();

        let payload = AtualizarUsuario {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        assert!(update_user(&pool, b.user_id, &payload).await.is_err());

        let payload = AtualizarUsuario {
            curso: Some("Biologia".into()),
            ..Default::default()
        };
        let b = update_user(&pool, b.user_id, &payload).await.unwrap();
        assert_eq!(b.curso, "Biologia");
        assert_eq!(b.email, "b@x.com");
    }
}
