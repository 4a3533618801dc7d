// src/models/colaboracao.rs
use crate::models::{
    datas::{deserialize_data, deserialize_data_opcional},
    imagem::Imagem,
    user::UserSummary,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Estado da revisão de uma colaboração.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum StatusColaboracao {
    #[serde(rename = "Em analise")]
    #[sqlx(rename = "Em analise")]
    EmAnalise,
    Aprovada,
    Rejeitada,
    #[serde(rename = "Algo a corrigir")]
    #[sqlx(rename = "Algo a corrigir")]
    AlgoACorrigir,
}

impl StatusColaboracao {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColaboracao::EmAnalise => "Em analise",
            StatusColaboracao::Aprovada => "Aprovada",
            StatusColaboracao::Rejeitada => "Rejeitada",
            StatusColaboracao::AlgoACorrigir => "Algo a corrigir",
        }
    }

    /// Nome usado pela listagem reduzida do front.
    pub fn front(&self) -> &'static str {
        match self {
            StatusColaboracao::EmAnalise => "pending",
            StatusColaboracao::Aprovada => "approved",
            StatusColaboracao::Rejeitada => "rejected",
            StatusColaboracao::AlgoACorrigir => "correction",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Colaboracao {
    pub colaboracao_id: i64,
    pub user_id: i64,
    pub nome_especie: String,
    pub data: NaiveDateTime,
    pub pais: String,
    pub regiao: String,
    pub estado: String,
    pub municipio: String,
    pub latitude: String,
    pub longitude: String,
    pub altitude: String,
    pub coletor: String,
    pub instituicao_coletor: String,
    pub autor_foto: String,
    pub instituicao_autor: String,
    #[sqlx(rename = "SISBIO")]
    #[serde(rename = "SISBIO")]
    pub sisbio: Option<String>,
    #[sqlx(rename = "SISGEN")]
    #[serde(rename = "SISGEN")]
    pub sisgen: Option<String>,
    pub observacoes: Option<String>,
    pub status: StatusColaboracao,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Linha de `colaboracoes` com o nome do autor (LEFT JOIN users).
#[derive(Debug, Clone, FromRow)]
pub struct ColaboracaoRow {
    #[sqlx(flatten)]
    pub colaboracao: Colaboracao,
    pub autor_nome: Option<String>,
}

/// Colaboração com `user { user_id, nome_completo }`.
#[derive(Debug, Clone, Serialize)]
pub struct ColaboracaoDetalhe {
    #[serde(flatten)]
    pub colaboracao: Colaboracao,
    pub user: Option<UserSummary>,
}

impl From<ColaboracaoRow> for ColaboracaoDetalhe {
    fn from(row: ColaboracaoRow) -> Self {
        let user = row.autor_nome.map(|nome_completo| UserSummary {
            user_id: row.colaboracao.user_id,
            nome_completo,
        });
        Self {
            colaboracao: row.colaboracao,
            user,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColaboracaoComImagens {
    #[serde(flatten)]
    pub colaboracao: Colaboracao,
    pub imagens: Vec<Imagem>,
}

/// Listagem reduzida (`GET /colaboracoes`).
#[derive(Debug, Clone, Serialize)]
pub struct ColaboracaoDto {
    pub colaboracao_id: i64,
    pub nome_especie: String,
    pub status: &'static str,
    pub user: Option<UserSummary>,
    pub pais: String,
    pub estado: String,
    pub municipio: String,
    pub regiao: String,
}

impl From<ColaboracaoRow> for ColaboracaoDto {
    fn from(row: ColaboracaoRow) -> Self {
        let ColaboracaoRow { colaboracao: c, autor_nome } = row;
        Self {
            colaboracao_id: c.colaboracao_id,
            nome_especie: c.nome_especie,
            status: c.status.front(),
            user: autor_nome.map(|nome_completo| UserSummary {
                user_id: c.user_id,
                nome_completo,
            }),
            pais: c.pais,
            estado: c.estado,
            municipio: c.municipio,
            regiao: c.regiao,
        }
    }
}

/// Latitude/longitude chegam como número ou texto (decimal ou graus/minutos/segundos).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CoordenadaInput {
    Numero(f64),
    Texto(String),
}

/// Altitude é guardada como texto, mas o front pode mandar número.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextoOuNumero {
    Numero(serde_json::Number),
    Texto(String),
}

impl TextoOuNumero {
    pub fn into_texto(self) -> String {
        match self {
            TextoOuNumero::Numero(n) => n.to_string(),
            TextoOuNumero::Texto(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NovaColaboracao {
    #[validate(length(min = 1, max = 255))]
    pub nome_especie: String,
    #[serde(deserialize_with = "deserialize_data")]
    pub data: NaiveDateTime,
    #[validate(length(min = 1, max = 100))]
    pub pais: String,
    #[validate(length(min = 1, max = 100))]
    pub regiao: String,
    #[validate(length(min = 1, max = 100))]
    pub estado: String,
    #[validate(length(min = 1, max = 100))]
    pub municipio: String,
    pub latitude: CoordenadaInput,
    pub longitude: CoordenadaInput,
    pub altitude: TextoOuNumero,
    #[validate(length(min = 1, max = 255))]
    pub coletor: String,
    #[validate(length(min = 1, max = 255))]
    pub instituicao_coletor: String,
    #[validate(length(min = 1, max = 255))]
    pub autor_foto: String,
    #[validate(length(min = 1, max = 255))]
    pub instituicao_autor: String,
    #[serde(rename = "SISBIO", default)]
    #[validate(length(min = 1, max = 100))]
    pub sisbio: Option<String>,
    #[serde(rename = "SISGEN", default)]
    #[validate(length(min = 1, max = 100))]
    pub sisgen: Option<String>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AtualizarColaboracao {
    #[validate(length(min = 1, max = 255))]
    pub nome_especie: Option<String>,
    #[serde(default, deserialize_with = "deserialize_data_opcional")]
    pub data: Option<NaiveDateTime>,
    #[validate(length(min = 1, max = 100))]
    pub pais: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub regiao: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub estado: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub municipio: Option<String>,
    pub latitude: Option<CoordenadaInput>,
    pub longitude: Option<CoordenadaInput>,
    pub altitude: Option<TextoOuNumero>,
    #[validate(length(min = 1, max = 255))]
    pub coletor: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub instituicao_coletor: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub autor_foto: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub instituicao_autor: Option<String>,
    #[serde(rename = "SISBIO")]
    #[validate(length(max = 100))]
    pub sisbio: Option<String>,
    #[serde(rename = "SISGEN")]
    #[validate(length(max = 100))]
    pub sisgen: Option<String>,
    pub observacoes: Option<String>,
    pub status: Option<StatusColaboracao>,
}

#[derive(Debug, Deserialize)]
pub struct AtualizarStatusColaboracao {
    pub status: StatusColaboracao,
}

/// Corpo de `POST /colaboracoes-filtros`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FiltrosColaboracao {
    #[serde(rename = "nome_especie")]
    pub nome_especie: Option<String>,
    pub pais: Option<String>,
    pub regiao: Option<String>,
    pub estado: Option<String>,
    pub municipio: Option<String>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub status: Option<StatusColaboracao>,
}

#[derive(Debug, Deserialize)]
pub struct ListaQuery {
    pub user_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_portuguese_labels() {
        let s: StatusColaboracao = serde_json::from_str(r#""Algo a corrigir""#).unwrap();
        assert_eq!(s, StatusColaboracao::AlgoACorrigir);
        assert_eq!(serde_json::to_string(&StatusColaboracao::EmAnalise).unwrap(), r#""Em analise""#);
        assert_eq!(StatusColaboracao::Rejeitada.front(), "rejected");
    }

    #[test]
    fn altitude_accepts_number_or_text() {
        let n: TextoOuNumero = serde_json::from_str("812").unwrap();
        assert_eq!(n.into_texto(), "812");
        let t: TextoOuNumero = serde_json::from_str(r#"" 1.200 m ""#).unwrap();
        assert_eq!(t.into_texto(), "1.200 m");
    }

    #[test]
    fn filtros_read_camel_case_dates() {
        let f: FiltrosColaboracao = serde_json::from_str(
            r#"{"nome_especie":"Apis mellifera","minDate":"2024-01-01","status":"Rejeitada"}"#,
        )
        .unwrap();
        assert_eq!(f.nome_especie.as_deref(), Some("Apis mellifera"));
        assert_eq!(f.min_date.as_deref(), Some("2024-01-01"));
        assert_eq!(f.status, Some(StatusColaboracao::Rejeitada));
    }
}
