// src/web/dashboard_handlers.rs
// Painel administrativo. Todas as rotas passam por require_auth + require_admin.
use crate::{
    error::AppResult,
    models::dashboard::{AtividadesQuery, DistribuicaoQuery, Dimensao, PeriodoQuery, SerieQuery},
    services::dashboard_service,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

// GET /admin/dashboard/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Query(query): Query<PeriodoQuery>,
) -> AppResult<impl IntoResponse> {
    let periodo = dashboard_service::parse_periodo(&query, Utc::now())?;
    Ok(Json(dashboard_service::summary(&state.db_pool, periodo).await?))
}

// GET /admin/dashboard/activities
pub async fn handle_activities(
    State(state): State<AppState>,
    Query(query): Query<AtividadesQuery>,
) -> AppResult<impl IntoResponse> {
    let periodo = dashboard_service::parse_periodo(&query.periodo, Utc::now())?;
    Ok(Json(dashboard_service::activities(&state.db_pool, &query, periodo).await?))
}

// GET /admin/dashboard/timeseries
pub async fn handle_timeseries(
    State(state): State<AppState>,
    Query(query): Query<SerieQuery>,
) -> AppResult<impl IntoResponse> {
    let periodo = dashboard_service::parse_periodo(&query.periodo, Utc::now())?;
    let (metrica, agrupamento) = dashboard_service::parse_serie(&query)?;
    tracing::debug!("Série {} por {}", metrica.as_str(), agrupamento.as_str());
    Ok(Json(
        dashboard_service::timeseries(&state.db_pool, metrica, agrupamento, periodo).await?,
    ))
}

// GET /admin/dashboard/distribution
pub async fn handle_distribution(
    State(state): State<AppState>,
    Query(query): Query<DistribuicaoQuery>,
) -> AppResult<impl IntoResponse> {
    let periodo = dashboard_service::parse_periodo(&query.periodo, Utc::now())?;
    Ok(Json(dashboard_service::distribution(&state.db_pool, &query.limit, periodo).await?))
}

async fn top(state: AppState, dimensao: Dimensao, query: DistribuicaoQuery) -> AppResult<impl IntoResponse> {
    let periodo = dashboard_service::parse_periodo(&query.periodo, Utc::now())?;
    Ok(Json(
        dashboard_service::distribution_top(&state.db_pool, dimensao, &query.limit, periodo).await?,
    ))
}

// GET /admin/dashboard/distribution/species
pub async fn handle_top_species(
    State(state): State<AppState>,
    Query(query): Query<DistribuicaoQuery>,
) -> AppResult<impl IntoResponse> {
    top(state, Dimensao::Especie, query).await
}

// GET /admin/dashboard/distribution/regions
pub async fn handle_top_regions(
    State(state): State<AppState>,
    Query(query): Query<DistribuicaoQuery>,
) -> AppResult<impl IntoResponse> {
    top(state, Dimensao::Regiao, query).await
}

// GET /admin/dashboard/distribution/cities
pub async fn handle_top_cities(
    State(state): State<AppState>,
    Query(query): Query<DistribuicaoQuery>,
) -> AppResult<impl IntoResponse> {
    top(state, Dimensao::Municipio, query).await
}
