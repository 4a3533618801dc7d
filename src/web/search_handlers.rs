// src/web/search_handlers.rs
use crate::{error::AppResult, models::search::SearchFilters, services::search_service, state::AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

// GET /api/search/colaboracoes (pública)
// Pares crus para aceitar `pais=A&pais=B` e `pais[]=A`.
pub async fn handle_search(
    State(state): State<AppState>,
    Query(pares): Query<Vec<(String, String)>>,
) -> AppResult<impl IntoResponse> {
    let filtros = SearchFilters::from_pairs(&pares);
    tracing::debug!("Busca avançada: {:?}", filtros);
    Ok(Json(search_service::search(&state.db_pool, &filtros).await?))
}

// GET /health
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }))
}
