// src/models/comentario.rs
use crate::models::user::UserSummary;
use chrono::{NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// Linha de 'comentarios' com o nome do autor (LEFT JOIN, o autor pode ter sido apagado)
#[derive(Debug, Clone, FromRow)]
pub struct ComentarioRow {
    pub comentario_id: i64,
    pub colaboracao_id: i64,
    pub user_id: Option<i64>,
    pub assunto: Option<String>,
    pub comentario: String,
    pub created_at: NaiveDateTime,
    pub autor_nome: Option<String>,
}

/// Comentário como o front o recebe.
#[derive(Debug, Clone, Serialize)]
pub struct ComentarioDto {
    pub comentario_id: i64,
    pub assunto: Option<String>,
    pub conteudo: String,
    pub colaboracao_id: i64,
    pub autor: Option<UserSummary>,
    pub created_at: String,
}

impl From<ComentarioRow> for ComentarioDto {
    fn from(row: ComentarioRow) -> Self {
        let autor = match (row.user_id, row.autor_nome) {
            (Some(user_id), Some(nome_completo)) => Some(UserSummary {
                user_id,
                nome_completo,
            }),
            _ => None,
        };
        Self {
            comentario_id: row.comentario_id,
            assunto: row.assunto,
            conteudo: row.comentario,
            colaboracao_id: row.colaboracao_id,
            autor,
            created_at: row.created_at.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NovoComentario {
    #[validate(length(max = 255))]
    pub assunto: Option<String>,
    pub conteudo: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AtualizarComentario {
    #[validate(length(max = 255))]
    pub assunto: Option<String>,
    pub conteudo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(user_id: Option<i64>, autor_nome: Option<&str>) -> ComentarioRow {
        ComentarioRow {
            comentario_id: 3,
            colaboracao_id: 7,
            user_id,
            assunto: None,
            comentario: "Foto tremida".into(),
            created_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 0, 0).unwrap(),
            autor_nome: autor_nome.map(Into::into),
        }
    }

    #[test]
    fn dto_renames_content_and_formats_date() {
        let dto = ComentarioDto::from(row(Some(2), Some("Bia")));
        assert_eq!(dto.conteudo, "Foto tremida");
        assert_eq!(dto.created_at, "2024-05-01T12:00:00.000Z");
        assert_eq!(dto.autor.unwrap().nome_completo, "Bia");
    }

    #[test]
    fn deleted_author_becomes_null() {
        let dto = ComentarioDto::from(row(None, None));
        assert!(dto.autor.is_none());
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json["autor"].is_null());
    }
}
