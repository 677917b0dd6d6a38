// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = self.user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        // Usuário desativado ou excluído derruba o token
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Compradores ativos (combo "responsável" da grade)
    pub async fn list_buyers(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_buyers().await
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        issue_token(&self.jwt_secret, user_id)
    }
}

/// bcrypt fora do runtime async (CPU-bound).
pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed_password = tokio::task::spawn_blocking(move || {
        hash(&password_clone, bcrypt::DEFAULT_COST)
    })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
        ?;
    Ok(hashed_password)
}

fn issue_token(secret: &str, user_id: Uuid) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_back_to_the_same_user() {
        let user_id = Uuid::new_v4();
        let token = issue_token("segredo-de-teste", user_id).unwrap();

        let claims = decode_token("segredo-de-teste", &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue_token("segredo-a", Uuid::new_v4()).unwrap();
        assert!(matches!(decode_token("segredo-b", &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(decode_token("x", "nao-e-um-jwt"), Err(AppError::InvalidToken)));
    }
}
