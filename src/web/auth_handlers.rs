// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginPayload, NovoUsuario, PedidoRecuperacao, RedefinirSenha, TokenQuery, User},
    services::{auth_service, user_service, user_service::VerificacaoPendente},
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde_json::json;
use validator::Validate;

const VALIDADE_RESET_HORAS: i64 = 1;
const VALIDADE_VERIFICACAO_HORAS: i64 = 24;

/// Criação de conta partilhada por `POST /register` e `POST /users`.
pub(crate) async fn registar(state: &AppState, payload: NovoUsuario) -> AppResult<User> {
    if payload.nome_completo.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.senha.is_empty()
    {
        return Err(AppError::BadRequest("Nome, e-mail e senha são obrigatórios.".into()));
    }
    payload.validate()?;

    let verificacao = state.config.require_email_verification.then(|| VerificacaoPendente {
        token: auth_service::random_token(),
        expira_em: (Utc::now() + Duration::hours(VALIDADE_VERIFICACAO_HORAS)).naive_utc(),
    });
    let token = verificacao.as_ref().map(|v| v.token.clone());

    let user = user_service::create_user(&state.db_pool, &payload, verificacao).await?;

    if let Some(token) = token {
        let link = format!(
            "{}/activate-account?token={}",
            state.config.frontend_url,
            urlencoding::encode(&token)
        );
        // Falha no envio não desfaz o registo
        if let Err(e) = state.mailer.send_verification(&user.email, &link).await {
            tracing::error!("Falha ao enviar verificação para {}: {}", user.email, e);
        }
    }
    Ok(user)
}

// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    payload: Result<Json<NovoUsuario>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let user = registar(&state, payload).await?;

    let message = if user.ativo {
        "Usuário criado com sucesso! Você já pode fazer login."
    } else {
        "Usuário criado! Verifique o seu e-mail para ativar a conta."
    };
    Ok((StatusCode::CREATED, Json(json!({ "message": message, "user": user }))))
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let email = payload.email.trim();
    if email.is_empty() || payload.senha.is_empty() {
        return Err(AppError::BadRequest("E-mail e senha são obrigatórios.".into()));
    }
    tracing::debug!("Tentativa de login para: {}", email);

    let user = user_service::find_user_by_email(&state.db_pool, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth_service::verify_password(&payload.senha, &user.senha).await? {
        tracing::warn!("Senha incorreta para: {}", email);
        return Err(AppError::InvalidCredentials);
    }

    if state.config.require_email_verification && !user.ativo {
        return Err(AppError::Forbidden(
            "Conta ainda não verificada. Confira o seu e-mail.".into(),
        ));
    }

    let token = auth_service::issue_token(&state.config, &user)?;
    tracing::info!("Login bem-sucedido para {} ({})", user.user_id, user.tipo.as_str());

    Ok(Json(json!({
        "message": "Login bem-sucedido",
        "token": token,
        "user": {
            "user_id": user.user_id,
            "email": user.email,
            "tipo": user.tipo,
            "nome_completo": user.nome_completo,
        }
    })))
}

// POST /request-password-reset
pub async fn handle_request_password_reset(
    State(state): State<AppState>,
    payload: Result<Json<PedidoRecuperacao>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("E-mail é obrigatório.".into()));
    }

    let user = user_service::find_user_by_email(&state.db_pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound("E-mail não encontrado.".into()))?;

    let token = auth_service::random_token();
    let expira_em = (Utc::now() + Duration::hours(VALIDADE_RESET_HORAS)).naive_utc();
    user_service::set_reset_token(&state.db_pool, user.user_id, &token, expira_em).await?;

    let link = format!(
        "{}/reset-password?token={}",
        state.config.frontend_url,
        urlencoding::encode(&token)
    );
    let mailer = state.mailer.clone();
    let destino = user.email.clone();
    // Responde já; o envio segue em segundo plano
    tokio::spawn(async move {
        if let Err(e) = mailer.send_password_reset(&destino, &link).await {
            tracing::error!("Falha ao enviar recuperação de senha para {}: {}", destino, e);
        }
    });

    Ok(Json(json!({ "message": "E-mail de recuperação enviado com sucesso." })))
}

// POST /reset-password?token=...
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    payload: Result<Json<RedefinirSenha>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let token = query.token.as_deref().map(str::trim).unwrap_or_default();
    if token.is_empty() || payload.nova_senha.is_empty() || payload.nova_senha_confirmacao.is_empty() {
        return Err(AppError::BadRequest("Token e nova senha são obrigatórios.".into()));
    }
    if payload.nova_senha != payload.nova_senha_confirmacao {
        return Err(AppError::BadRequest("Senhas não coincidem.".into()));
    }
    payload.validate()?;

    user_service::reset_password_with_token(&state.db_pool, token, &payload.nova_senha).await?;
    Ok(Json(json!({ "message": "Senha redefinida com sucesso." })))
}

// GET /verify-email?token=...
pub async fn handle_verify_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> AppResult<impl IntoResponse> {
    let token = query.token.as_deref().map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return Err(AppError::BadRequest("Token de verificação ausente.".into()));
    }

    let user = user_service::verify_email(&state.db_pool, token).await?;
    tracing::info!("Conta {} ativada", user.user_id);
    Ok(Json(json!({ "message": "E-mail verificado com sucesso. Conta ativada!" })))
}
