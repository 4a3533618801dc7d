// src/config.rs
use crate::error::{AppError, AppResult};
use std::env;

/// Credenciais da conta Cloudinary (hospedagem das imagens).
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Servidor SMTP usado para os e-mails transacionais.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Configuração lida das variáveis de ambiente (e do `.env`, via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub frontend_url: String,
    pub require_email_verification: bool,
    pub cloudinary: Option<CloudinaryConfig>,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(AppError::Config("JWT_SECRET está vazio".into()));
        }
        if jwt_secret.len() < 32 {
            tracing::warn!("⚠️ JWT_SECRET é curta, considere usar uma chave mais longa e aleatória!");
        }

        let cloudinary = match (
            env::var("CLOUDINARY_CLOUD_NAME"),
            env::var("CLOUDINARY_API_KEY"),
            env::var("CLOUDINARY_API_SECRET"),
        ) {
            (Ok(cloud_name), Ok(api_key), Ok(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let smtp = match (env::var("EMAIL_HOST"), env::var("EMAIL_USER"), env::var("EMAIL_PASS")) {
            (Ok(host), Ok(user), Ok(pass)) => Some(SmtpConfig {
                host,
                port: parse_var("EMAIL_PORT", 587)?,
                user,
                pass,
                from: env::var("EMAIL_FROM").unwrap_or_else(|_| "no-reply@meuprojeto.com".into()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://colaboracoes.db".into()),
            port: parse_var("PORT", 3000)?,
            jwt_secret,
            jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS", 8)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            require_email_verification: parse_var("REQUIRE_EMAIL_VERIFICATION", false)?,
            cloudinary,
            smtp,
        })
    }
}

// Lê uma variável opcional, usando `default` quando ausente.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("valor inválido para {}: '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuração mínima para os testes (sem Cloudinary nem SMTP).
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            port: 0,
            jwt_secret: "segredo-de-teste-com-tamanho-suficiente-para-hs256".into(),
            jwt_expiration_hours: 8,
            frontend_url: "http://localhost:8080".into(),
            require_email_verification: false,
            cloudinary: None,
            smtp: None,
        }
    }
}
