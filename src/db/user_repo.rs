use sqlx::PgPool;
use uuid::Uuid;
use crate::{common::error::AppError, models::auth::User};

// Campos editáveis pelo administrador
#[derive(Debug, Clone)]
pub struct UserFields<'a> {
    pub username: &'a str,
    pub name: &'a str,
    pub is_buyer: bool,
    pub is_admin: bool,
}

fn map_username_conflict(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UsernameAlreadyExists;
        }
    }
    AppError::DatabaseError(e)
}

/// Trecho de busca para ILIKE, com os curingas do usuário escapados.
pub fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário ativo pelo login
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 AND is_active = TRUE")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    // Busca um usuário ativo pelo seu ID (base da validação do token)
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    // Compradores disponíveis para assumir uma grade
    pub async fn list_buyers(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE is_buyer = TRUE AND is_active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    // =========================================================================
    //  ADMINISTRAÇÃO
    // =========================================================================

    pub async fn count(&self, search: Option<&str>) -> Result<u64, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE $1::text IS NULL OR name ILIKE $1 OR username ILIKE $1",
        )
        .bind(search.map(contains_pattern))
        .fetch_one(&self.pool)
        .await?;
        Ok(total.max(0) as u64)
    }

    // Ativos e inativos, por nome
    pub async fn list(&self, search: Option<&str>, limit: u32, offset: u64) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE $1::text IS NULL OR name ILIKE $1 OR username ILIKE $1
            ORDER BY name ASC, username ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search.map(contains_pattern))
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    pub async fn find_any(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    pub async fn has_admin(&self) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE is_admin = TRUE)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user(&self, fields: &UserFields<'_>, hashed_password: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, name, password_hash, is_buyer, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(fields.username)
        .bind(fields.name)
        .bind(hashed_password)
        .bind(fields.is_buyer)
        .bind(fields.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(map_username_conflict)
    }

    pub async fn update(&self, id: Uuid, fields: &UserFields<'_>) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, name = $3, is_buyer = $4, is_admin = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.username)
        .bind(fields.name)
        .bind(fields.is_buyer)
        .bind(fields.is_admin)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_username_conflict)?
        .ok_or(AppError::UserNotFound)
    }

    pub async fn set_password(&self, id: Uuid, hashed_password: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(hashed_password)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::UserNotFound)
    }

    // As grades do usuário ficam sem comprador (ON DELETE SET NULL)
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}
