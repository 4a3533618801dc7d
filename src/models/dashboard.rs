// src/models/dashboard.rs
// Respostas do painel administrativo (camelCase, como o front espera).
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Intervalo efetivo de uma consulta do painel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periodo {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodoDto {
    pub from: String,
    pub to: String,
}

impl From<Periodo> for PeriodoDto {
    fn from(p: Periodo) -> Self {
        Self {
            from: p.from.to_rfc3339_opts(SecondsFormat::Millis, true),
            to: p.to.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Parâmetros comuns a todas as rotas do painel.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodoQuery {
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AtividadesQuery {
    #[serde(flatten)]
    pub periodo: PeriodoQuery,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub types: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerieQuery {
    #[serde(flatten)]
    pub periodo: PeriodoQuery,
    pub metric: Option<String>,
    pub group_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DistribuicaoQuery {
    #[serde(flatten)]
    pub periodo: PeriodoQuery,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UsersByType {
    pub common: i64,
    pub collaborator: i64,
    pub admin: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_users: i64,
    pub total_images: i64,
    pub pending_collaborations: i64,
    pub pending_images: i64,
    pub new_users_this_period: i64,
    pub new_images_this_period: i64,
    pub users_by_type: UsersByType,
    pub period: PeriodoDto,
}

/// Tipos de atividade aceites em `types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoAtividade {
    UserRegistration,
    ImageUpload,
    CollaborationSubmitted,
    ImageApproved,
    ImageRejected,
}

impl TipoAtividade {
    pub const TODOS: [TipoAtividade; 5] = [
        TipoAtividade::UserRegistration,
        TipoAtividade::ImageUpload,
        TipoAtividade::CollaborationSubmitted,
        TipoAtividade::ImageApproved,
        TipoAtividade::ImageRejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TipoAtividade::UserRegistration => "user_registration",
            TipoAtividade::ImageUpload => "image_upload",
            TipoAtividade::CollaborationSubmitted => "collaboration_submitted",
            TipoAtividade::ImageApproved => "image_approved",
            TipoAtividade::ImageRejected => "image_rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::TODOS.into_iter().find(|t| t.as_str() == raw)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AtividadeUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtividadeEntity {
    #[serde(rename = "type")]
    pub tipo: &'static str,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Atividade {
    pub id: String,
    #[serde(rename = "type")]
    pub tipo: &'static str,
    pub description: &'static str,
    pub date: String,
    pub user: AtividadeUser,
    pub entity: AtividadeEntity,
    // Chave de ordenação; a data formatada é o que sai no JSON
    #[serde(skip)]
    pub quando: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AtividadesResponse {
    pub items: Vec<Atividade>,
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
    pub period: PeriodoDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metrica {
    Uploads,
    Registrations,
}

impl Metrica {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metrica::Uploads => "uploads",
            Metrica::Registrations => "registrations",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agrupamento {
    Day,
    Week,
    Month,
}

impl Agrupamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            Agrupamento::Day => "day",
            Agrupamento::Week => "week",
            Agrupamento::Month => "month",
        }
    }

    /// Formato `strftime` do SQLite usado para agrupar.
    pub fn formato_sql(&self) -> &'static str {
        match self {
            Agrupamento::Day => "%Y-%m-%d",
            Agrupamento::Week => "%Y-%W",
            Agrupamento::Month => "%Y-%m",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
pub struct PontoSerie {
    pub date: String,
    pub value: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerieResponse {
    pub metric: &'static str,
    pub group_by: &'static str,
    pub points: Vec<PontoSerie>,
    pub period: PeriodoDto,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
pub struct Contagem {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DistribuicaoResponse {
    pub species: Vec<Contagem>,
    pub countries: Vec<Contagem>,
    pub states: Vec<Contagem>,
    pub period: PeriodoDto,
}

/// Dimensão das distribuições "top N + outros".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensao {
    Especie,
    Regiao,
    Municipio,
}

impl Dimensao {
    pub fn coluna(&self) -> &'static str {
        match self {
            Dimensao::Especie => "nome_especie",
            Dimensao::Regiao => "regiao",
            Dimensao::Municipio => "municipio",
        }
    }

    /// Rótulo usado quando o campo está em branco.
    pub fn vazio(&self) -> &'static str {
        match self {
            Dimensao::Especie => "Não especificada",
            Dimensao::Regiao | Dimensao::Municipio => "Não informado",
        }
    }

    /// Nome da chave de cada item em `top`.
    pub fn chave(&self) -> &'static str {
        match self {
            Dimensao::Especie => "species",
            Dimensao::Regiao => "region",
            Dimensao::Municipio => "city",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub top: Vec<serde_json::Value>,
    pub others: i64,
    pub total: i64,
    pub period: PeriodoDto,
}
