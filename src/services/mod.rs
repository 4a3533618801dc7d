// src/services/mod.rs
pub mod auth_service;
pub mod colaboracao_service;
pub mod comentario_service;
pub mod coordenadas;
pub mod dashboard_service;
pub mod email_service;
pub mod image_host;
pub mod imagem_service;
pub mod search_service;
pub mod user_service;
