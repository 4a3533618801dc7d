// src/services/email_service.rs
use crate::{
    config::SmtpConfig,
    error::{AppError, AppResult},
};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

/// E-mails transacionais da aplicação.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, email: &str, reset_link: &str) -> AppResult<()>;
    async fn send_verification(&self, email: &str, verification_link: &str) -> AppResult<()>;
}

fn corpo_recuperacao(reset_link: &str) -> String {
    format!(
        r#"<h1>Recuperação de Senha</h1>
<p>Olá,</p>
<p>Recebemos uma solicitação para redefinir sua senha. Clique no link abaixo para continuar:</p>
<a href="{reset_link}" style="color: #007bff; text-decoration: none;">Redefinir Senha</a>
<p>Se você não solicitou essa alteração, ignore este e-mail.</p>
<p>Este link é válido por 1 hora.</p>"#
    )
}

fn corpo_verificacao(verification_link: &str) -> String {
    format!(
        r#"<h1>Verifique seu e-mail</h1>
<p>Obrigado por se registrar!</p>
<p>Clique no link abaixo para verificar seu endereço de e-mail e ativar sua conta:</p>
<a href="{verification_link}" style="color: #28a745; text-decoration: none;">Verificar E-mail</a>
<p>Este link expira em 24 horas.</p>"#
    )
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Config(format!("SMTP inválido: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    async fn send_html(&self, to: &str, subject: &str, html: String) -> AppResult<()> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| AppError::Email(format!("remetente inválido: {}", e)))?)
            .to(to.parse().map_err(|e| AppError::Email(format!("destinatário inválido: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| AppError::Email(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;
        tracing::info!("E-mail '{}' enviado para {}", subject, to);
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, email: &str, reset_link: &str) -> AppResult<()> {
        self.send_html(email, "Redefinição de Senha", corpo_recuperacao(reset_link))
            .await
    }

    async fn send_verification(&self, email: &str, verification_link: &str) -> AppResult<()> {
        self.send_html(email, "Verificação de E-mail", corpo_verificacao(verification_link))
            .await
    }
}

/// Sem SMTP configurado: só regista o link no log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &str, reset_link: &str) -> AppResult<()> {
        tracing::info!("[mail] Recuperação de senha para {}: {}", email, reset_link);
        Ok(())
    }

    async fn send_verification(&self, email: &str, verification_link: &str) -> AppResult<()> {
        tracing::info!("[mail] Verificação de e-mail para {}: {}", email, verification_link);
        Ok(())
    }
}

/// Guarda as mensagens em memória para os testes inspecionarem.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryMailer {
    pub enviados: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_password_reset(&self, email: &str, reset_link: &str) -> AppResult<()> {
        self.enviados.lock().unwrap().push((email.into(), reset_link.into()));
        Ok(())
    }

    async fn send_verification(&self, email: &str, verification_link: &str) -> AppResult<()> {
        self.enviados.lock().unwrap().push((email.into(), verification_link.into()));
        Ok(())
    }
}
