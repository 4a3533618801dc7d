// src/state.rs
use crate::{
    config::Config,
    services::{email_service::Mailer, image_host::ImageHost},
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
    // Serviço de imagens (Cloudinary em produção)
    pub image_host: Arc<dyn ImageHost>,
    pub mailer: Arc<dyn Mailer>,
}

// Permite extrair o pool da DB diretamente
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Arc<Config> {
        state.config.clone()
    }
}
