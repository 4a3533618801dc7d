// src/test_support.rs
// Dados de exemplo partilhados pelos testes dos serviços e das rotas.
use crate::{
    error::AppResult,
    models::{
        colaboracao::{Colaboracao, CoordenadaInput, NovaColaboracao, TextoOuNumero},
        user::{NovoUsuario, User},
    },
    services::{
        colaboracao_service,
        image_host::{ImageHost, ImagemHospedada},
        user_service,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::sync::Mutex;

pub const SENHA: &str = "senha-segura";

pub async fn seed_user(pool: &SqlitePool, email: &str) -> User {
    let payload = NovoUsuario {
        nome_completo: format!("Teste {}", email),
        email: email.into(),
        senha: SENHA.into(),
        ..Default::default()
    };
    user_service::create_user(pool, &payload, None).await.unwrap()
}

pub fn nova_colaboracao(nome_especie: &str) -> NovaColaboracao {
    NovaColaboracao {
        nome_especie: nome_especie.into(),
        data: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        pais: "Brasil".into(),
        regiao: "Centro-Oeste".into(),
        estado: "Goiás".into(),
        municipio: "Pirenópolis".into(),
        latitude: CoordenadaInput::Numero(-15.85),
        longitude: CoordenadaInput::Numero(-47.9),
        altitude: TextoOuNumero::Numero(1100.into()),
        coletor: "Equipe de campo".into(),
        instituicao_coletor: "UFG".into(),
        autor_foto: "Fotógrafa".into(),
        instituicao_autor: "UFG".into(),
        sisbio: None,
        sisgen: None,
        observacoes: None,
    }
}

pub async fn seed_colaboracao(pool: &SqlitePool, user_id: i64, nome_especie: &str) -> Colaboracao {
    colaboracao_service::create(pool, user_id, &nova_colaboracao(nome_especie))
        .await
        .unwrap()
}

/// Serviço de imagens falso: devolve URLs no formato da Cloudinary e regista as remoções.
#[derive(Default)]
pub struct HostFalso {
    pub removidos: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageHost for HostFalso {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        _mime: &str,
        folder: &str,
        public_id: &str,
    ) -> AppResult<ImagemHospedada> {
        Ok(ImagemHospedada {
            public_id: format!("{}/{}", folder, public_id),
            secure_url: format!(
                "https://res.cloudinary.com/demo/image/upload/v1/{}/{}.jpg",
                folder, public_id
            ),
        })
    }

    async fn destroy(&self, public_id: &str) -> AppResult<()> {
        self.removidos.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}
