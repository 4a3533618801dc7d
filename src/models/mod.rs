// src/models/mod.rs
pub mod colaboracao;
pub mod comentario;
pub mod dashboard;
pub mod datas;
pub mod imagem;
pub mod search;
pub mod user;
