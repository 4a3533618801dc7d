// src/services/auth_service.rs
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::user::{Claims, User},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
// Custo baixo nos testes, senão cada hash leva centenas de ms
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, BCRYPT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Emite um JWT HS256 para o utilizador, válido por `jwt_expiration_hours`.
pub fn issue_token(config: &Config, user: &User) -> AppResult<String> {
    let agora = Utc::now();
    let claims = Claims {
        user_id: user.user_id,
        email: user.email.clone(),
        tipo: user.tipo,
        nome_completo: user.nome_completo.clone(),
        iat: agora.timestamp() as usize,
        exp: (agora + Duration::hours(config.jwt_expiration_hours)).timestamp() as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Falha ao assinar JWT: {:?}", e);
        AppError::InternalServerError
    })
}

/// Valida assinatura e expiração. Qualquer falha vira 403.
pub fn decode_token(config: &Config, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT rejeitado: {}", e);
        AppError::Forbidden("Token inválido ou expirado".into())
    })
}

/// Token opaco para recuperação de senha e verificação de e-mail.
pub fn random_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::TipoUsuario;
    use chrono::NaiveDateTime;

    fn user() -> User {
        User {
            user_id: 42,
            tipo: TipoUsuario::Colaborador,
            nome_completo: "Carla Souza".into(),
            telefone: None,
            whatsapp: None,
            email: "carla@exemplo.com".into(),
            instituicao: String::new(),
            curso: String::new(),
            nivel_academico: String::new(),
            link_lattes: String::new(),
            senha: String::new(),
            reset_token: None,
            reset_token_expiration: None,
            ativo: true,
            email_verification_token: None,
            email_verification_expires: None,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("senha-forte-123").await.unwrap();
        assert!(verify_password("senha-forte-123", &hash).await.unwrap());
        assert!(!verify_password("outra-senha", &hash).await.unwrap());
    }

    #[test]
    fn token_carries_claims() {
        let config = Config::for_tests();
        let token = issue_token(&config, &user()).unwrap();
        let claims = decode_token(&config, &token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.tipo, TipoUsuario::Colaborador);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_forbidden() {
        let mut outra = Config::for_tests();
        outra.jwt_secret = "um-segredo-completamente-diferente-do-original".into();
        let token = issue_token(&outra, &user()).unwrap();

        let err = decode_token(&Config::for_tests(), &token).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn expired_token_is_forbidden() {
        let mut config = Config::for_tests();
        config.jwt_expiration_hours = -2;
        let token = issue_token(&config, &user()).unwrap();
        assert!(decode_token(&Config::for_tests(), &token).is_err());
    }
}
