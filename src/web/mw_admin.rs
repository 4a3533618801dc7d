// src/web/mw_admin.rs
use crate::{error::AppError, models::user::Claims};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

/// Exige `tipo = Admin`. Deve correr *depois* de `require_auth`.
pub async fn require_admin(
    Extension(claims): Extension<Claims>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if claims.is_admin() {
        tracing::debug!("Admin MW: acesso concedido para {}", claims.user_id);
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Admin MW: acesso negado para {} ({:?})", claims.user_id, claims.tipo);
        Err(AppError::Forbidden("Acesso negado. Permissão insuficiente.".into()))
    }
}
