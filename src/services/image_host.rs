// src/services/image_host.rs
use crate::{
    config::CloudinaryConfig,
    error::{AppError, AppResult},
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha1::{Digest, Sha1};

/// Pasta onde ficam as fotos das colaborações.
pub const PASTA_COLABORACOES: &str = "colaboracoes";

#[derive(Debug, Clone, PartialEq)]
pub struct ImagemHospedada {
    pub public_id: String,
    pub secure_url: String,
}

/// Serviço externo que guarda os ficheiros de imagem.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        folder: &str,
        public_id: &str,
    ) -> AppResult<ImagemHospedada>;

    async fn destroy(&self, public_id: &str) -> AppResult<()>;
}

/// Cliente REST da Cloudinary com pedidos assinados.
pub struct CloudinaryClient {
    http: Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.config.cloud_name, action
        )
    }
}

/// Assinatura: parâmetros ordenados por nome, `k=v` unidos por `&`, seguidos do segredo.
pub fn assinatura(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut ordenados = params.to_vec();
    ordenados.sort_by(|a, b| a.0.cmp(b.0));
    let base = ordenados
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!("{:x}", Sha1::digest(format!("{}{}", base, api_secret).as_bytes()))
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        folder: &str,
        public_id: &str,
    ) -> AppResult<ImagemHospedada> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = assinatura(
            &[("folder", folder), ("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let file = multipart::Part::bytes(bytes)
            .file_name(public_id.to_string())
            .mime_str(mime)
            .map_err(|e| AppError::BadRequest(format!("Tipo de ficheiro inválido: {}", e)))?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("public_id", public_id.to_string())
            .text("signature", signature);

        tracing::debug!("Enviando imagem '{}/{}' para a Cloudinary", folder, public_id);
        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ImageHost(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ImageHost(format!("upload falhou ({}): {}", status, body)));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageHost(e.to_string()))?;
        tracing::info!("Imagem hospedada: {}", body.public_id);
        Ok(ImagemHospedada {
            public_id: body.public_id,
            secure_url: body.secure_url,
        })
    }

    async fn destroy(&self, public_id: &str) -> AppResult<()> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = assinatura(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ImageHost(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ImageHost(format!(
                "destroy de '{}' falhou ({})",
                public_id,
                response.status()
            )));
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageHost(e.to_string()))?;
        tracing::info!("Imagem '{}' removida da Cloudinary: {}", public_id, body.result);
        Ok(())
    }
}

/// Usado quando as credenciais da Cloudinary não estão definidas.
pub struct UnconfiguredImageHost;

#[async_trait]
impl ImageHost for UnconfiguredImageHost {
    async fn upload(&self, _: Vec<u8>, _: &str, _: &str, _: &str) -> AppResult<ImagemHospedada> {
        Err(AppError::ImageHostUnavailable)
    }

    async fn destroy(&self, public_id: &str) -> AppResult<()> {
        tracing::warn!("Cloudinary não configurada, '{}' não foi removida", public_id);
        Ok(())
    }
}

/// Extrai o public id a partir da URL guardada.
///
/// `https://res.cloudinary.com/demo/image/upload/v1712/colaboracoes/7_A1_99.jpg`
/// dá `colaboracoes/7_A1_99`.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let sem_query = url.split(['?', '#']).next().unwrap_or(url);

    let caminho = match sem_query.split_once("/upload/") {
        Some((_, resto)) => {
            let mut segmentos: Vec<&str> = resto.split('/').filter(|s| !s.is_empty()).collect();
            let versao = segmentos
                .first()
                .is_some_and(|s| s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit()));
            if versao {
                segmentos.remove(0);
            }
            segmentos.join("/")
        }
        None => {
            let ultimo = sem_query.rsplit('/').next()?;
            format!("{}/{}", PASTA_COLABORACOES, ultimo)
        }
    };

    let id = match caminho.rsplit_once('.') {
        Some((base, _ext)) if !base.ends_with('/') => base.to_string(),
        _ => caminho,
    };
    (!id.is_empty() && !id.ends_with('/')).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_id_drops_version_and_extension() {
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/v1712345/colaboracoes/7_A1_99.jpg")
                .as_deref(),
            Some("colaboracoes/7_A1_99")
        );
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/colaboracoes/x.png?foo=1").as_deref(),
            Some("colaboracoes/x")
        );
    }

    #[test]
    fn public_id_fallback_uses_default_folder() {
        assert_eq!(
            public_id_from_url("https://cdn.exemplo.com/fotos/abc.webp").as_deref(),
            Some("colaboracoes/abc")
        );
        assert_eq!(public_id_from_url("https://cdn.exemplo.com/"), None);
    }

    #[test]
    fn signature_sorts_params() {
        // Exemplo da documentação da Cloudinary
        let assinada = assinatura(
            &[("timestamp", "1315060510"), ("public_id", "sample_image"), ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop")],
            "abcd",
        );
        assert_eq!(assinada, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[tokio::test]
    async fn unconfigured_host_refuses_uploads() {
        let host = UnconfiguredImageHost;
        let err = host.upload(vec![1, 2, 3], "image/png", PASTA_COLABORACOES, "x").await.unwrap_err();
        assert!(matches!(err, AppError::ImageHostUnavailable));
        assert!(host.destroy("colaboracoes/x").await.is_ok());
    }
}
