// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod db;
mod error;
mod models;
mod services;
mod state;
mod web;
#[cfg(test)]
mod test_support;

// --- Imports ---
use crate::{
    config::Config,
    services::{
        email_service::{LogMailer, Mailer, SmtpMailer},
        image_host::{CloudinaryClient, ImageHost, UnconfiguredImageHost},
    },
    state::AppState,
};
use axum::{
    http::{header, HeaderValue, Method},
    serve,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "colaboracoes_api=debug,tower_http=info,sqlx=warn".into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando API de colaborações...");

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Configuração inválida: {}", e))?;

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    // --- Serviços externos ---
    let image_host: Arc<dyn ImageHost> = match config.cloudinary.clone() {
        Some(cloudinary) => {
            tracing::info!("🖼️ Cloudinary configurado ({})", cloudinary.cloud_name);
            Arc::new(CloudinaryClient::new(cloudinary))
        }
        None => {
            tracing::warn!("⚠️ Cloudinary não configurado: uploads vão responder 503");
            Arc::new(UnconfiguredImageHost)
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!("📧 SMTP configurado ({}:{})", smtp.host, smtp.port);
            Arc::new(SmtpMailer::new(smtp).map_err(|e| anyhow::anyhow!("SMTP inválido: {}", e))?)
        }
        None => {
            tracing::warn!("⚠️ SMTP não configurado: e-mails só vão para o log");
            Arc::new(LogMailer)
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let port = config.port;

    // --- Criação do Estado da Aplicação ---
    let app_state = AppState {
        db_pool,
        config: Arc::new(config),
        image_host,
        mailer,
    };

    // --- Configuração do Endereço e Listener ---
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("📡 Servidor escutando em http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener na porta {}: {}", port, e);
            return Err(e.into());
        }
    };

    // --- Router e Middlewares ---
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );
    tracing::info!("✅ Router e middlewares configurados.");

    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
