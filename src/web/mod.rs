// src/web/mod.rs
pub mod auth_handlers;
pub mod colaboracao_handlers;
pub mod comentario_handlers;
pub mod dashboard_handlers;
pub mod imagem_handlers;
pub mod mw_admin;
pub mod mw_auth;
pub mod routes;
pub mod search_handlers;
pub mod user_handlers;
