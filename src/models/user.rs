// src/models/user.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Papel do utilizador no sistema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum TipoUsuario {
    Comum,
    Colaborador,
    Admin,
}

impl TipoUsuario {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoUsuario::Comum => "Comum",
            TipoUsuario::Colaborador => "Colaborador",
            TipoUsuario::Admin => "Admin",
        }
    }
}

// Representa um utilizador lido da tabela 'users'.
// Hash da senha e tokens nunca saem na resposta JSON.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub user_id: i64,
    pub tipo: TipoUsuario,
    pub nome_completo: String,
    pub telefone: Option<i64>,
    pub whatsapp: Option<i64>,
    pub email: String,
    pub instituicao: String,
    pub curso: String,
    pub nivel_academico: String,
    pub link_lattes: String,
    #[serde(skip_serializing)]
    pub senha: String,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiration: Option<NaiveDateTime>,
    pub ativo: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_expires: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.user_id,
            nome_completo: self.nome_completo.clone(),
        }
    }
}

/// Forma reduzida usada dentro de colaborações e comentários.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub user_id: i64,
    pub nome_completo: String,
}

/// Conteúdo do JWT (e o que os handlers recebem do middleware).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub tipo: TipoUsuario,
    pub nome_completo: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.tipo == TipoUsuario::Admin
    }

    /// O próprio utilizador ou um administrador.
    pub fn can_act_on(&self, owner_id: i64) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

// --- Payloads ---

/// Usado tanto por `POST /users` como por `POST /register`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NovoUsuario {
    #[validate(length(min = 1, max = 255, message = "Nome é obrigatório."))]
    pub nome_completo: String,
    #[validate(email(message = "E-mail inválido."))]
    pub email: String,
    #[validate(length(min = 8, max = 255, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub senha: String,
    pub telefone: Option<i64>,
    pub whatsapp: Option<i64>,
    #[validate(length(max = 255))]
    pub instituicao: Option<String>,
    #[validate(length(max = 255))]
    pub curso: Option<String>,
    #[validate(length(max = 100))]
    pub nivel_academico: Option<String>,
    #[validate(length(max = 255))]
    pub link_lattes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AtualizarUsuario {
    #[validate(length(min = 1, max = 255))]
    pub nome_completo: Option<String>,
    pub telefone: Option<i64>,
    pub whatsapp: Option<i64>,
    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub instituicao: Option<String>,
    #[validate(length(max = 255))]
    pub curso: Option<String>,
    #[validate(length(max = 100))]
    pub nivel_academico: Option<String>,
    #[validate(length(max = 255))]
    pub link_lattes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtualizarTipo {
    pub tipo: TipoUsuario,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct AtualizarSenha {
    pub senha_atual: String,
    #[validate(length(min = 8, max = 255, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub nova_senha: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginPayload {
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PedidoRecuperacao {
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RedefinirSenha {
    #[validate(length(min = 8, max = 255, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub nova_senha: String,
    pub nova_senha_confirmacao: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}
