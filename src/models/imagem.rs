// src/models/imagem.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum StatusImagem {
    #[serde(rename = "Análise")]
    #[sqlx(rename = "Análise")]
    Analise,
    Aprovada,
    Reprovada,
}

impl StatusImagem {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusImagem::Analise => "Análise",
            StatusImagem::Aprovada => "Aprovada",
            StatusImagem::Reprovada => "Reprovada",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Imagem {
    pub imagem_id: i64,
    pub colaboracao_id: i64,
    pub codigo_imagem: String,
    pub url_imagem: String,
    pub descricao: String,
    pub status: StatusImagem,
}

/// Imagem com o dono da colaboração, para as verificações de permissão.
#[derive(Debug, Clone, FromRow)]
pub struct ImagemComDono {
    #[sqlx(flatten)]
    pub imagem: Imagem,
    pub dono_id: i64,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AtualizarImagem {
    #[validate(length(min = 1, max = 255))]
    pub codigo_imagem: Option<String>,
    #[validate(length(max = 255))]
    pub descricao: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtualizarStatusImagem {
    pub status: StatusImagem,
}

/// Resposta do upload (`POST /imagens/{id}/upload`).
#[derive(Debug, Serialize)]
pub struct ImagemCriada {
    pub success: bool,
    pub message: String,
    pub imagem: Imagem,
}
