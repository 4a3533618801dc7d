// src/web/mw_auth.rs
use crate::{error::AppError, models::user::Claims, services::auth_service, state::AppState};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

// Middleware que exige `Authorization: Bearer <jwt>` válido
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        tracing::debug!("Autenticação MW: sem token Bearer em {}", request.uri().path());
        return Err(AppError::Unauthorized("Token não fornecido ou mal formatado".into()));
    };

    let claims = auth_service::decode_token(&state.config, token)?;
    tracing::debug!("Autenticação MW: utilizador {} autenticado", claims.user_id);

    // Os handlers protegidos leem as claims via Extension<Claims>
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Regra "dono ou admin" das rotas que alteram dados.
pub fn ensure_owner_or_admin(claims: &Claims, owner_id: i64) -> Result<(), AppError> {
    if claims.can_act_on(owner_id) {
        Ok(())
    } else {
        tracing::warn!("Utilizador {} tentou alterar recurso de {}", claims.user_id, owner_id);
        Err(AppError::Forbidden("Acesso negado. Permissão insuficiente.".into()))
    }
}
