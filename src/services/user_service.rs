// src/services/user_service.rs
//
// Cadastro de usuários: só administradores criam, editam, ativam/desativam e excluem.

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::page_window},
    db::{user_repo::UserFields, UserRepository},
    models::auth::{User, UserPage},
    services::auth::hash_password,
};

const USERS_PER_PAGE: u32 = 10;

pub fn ensure_admin(actor: &User) -> Result<(), AppError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Apenas administradores podem gerenciar usuários.".into()))
    }
}

/// Impede que o administrador desative ou exclua a própria conta.
pub fn ensure_not_self(actor: &User, target: Uuid, action: &str) -> Result<(), AppError> {
    if actor.id == target {
        return Err(AppError::Conflict(format!("Você não pode {} seu próprio usuário.", action)));
    }
    Ok(())
}

fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|t| !t.is_empty())
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    pub async fn list(
        &self,
        actor: &User,
        search: Option<&str>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<UserPage, AppError> {
        ensure_admin(actor)?;
        let search = search_term(search);

        let total = self.user_repo.count(search).await?;
        let window = page_window(total, page, per_page, USERS_PER_PAGE);
        let items = self.user_repo.list(search, window.per_page, window.offset).await?;

        Ok(UserPage {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            total_pages: window.total_pages,
        })
    }

    pub async fn create(&self, actor: &User, fields: &UserFields<'_>, password: &str) -> Result<User, AppError> {
        ensure_admin(actor)?;

        let hashed_password = hash_password(password).await?;
        let fields = UserFields { username: fields.username.trim(), name: fields.name.trim(), ..*fields };
        let user = self.user_repo.create_user(&fields, &hashed_password).await?;

        let kind = if user.is_buyer { "Comprador" } else { "Administrativo" };
        tracing::info!("👤 Usuário '{}' ({}) cadastrado por '{}'.", user.username, kind, actor.username);
        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        fields: &UserFields<'_>,
        password: Option<&str>,
    ) -> Result<User, AppError> {
        ensure_admin(actor)?;
        // Perder o próprio acesso de administrador trancaria o cadastro
        if actor.id == id && !fields.is_admin {
            return Err(AppError::Conflict(
                "Você não pode remover seu próprio acesso de administrador.".into(),
            ));
        }

        let fields = UserFields { username: fields.username.trim(), name: fields.name.trim(), ..*fields };
        let user = self.user_repo.update(id, &fields).await?;

        if let Some(password) = password {
            let hashed_password = hash_password(password).await?;
            self.user_repo.set_password(id, &hashed_password).await?;
        }

        Ok(user)
    }

    /// Ativa ou inativa (exclusão lógica).
    pub async fn toggle_active(&self, actor: &User, id: Uuid) -> Result<User, AppError> {
        ensure_admin(actor)?;
        ensure_not_self(actor, id, "desativar")?;

        let current = self.user_repo.find_any(id).await?.ok_or(AppError::UserNotFound)?;
        let user = self.user_repo.set_active(id, !current.is_active).await?;

        let status = if user.is_active { "ativado" } else { "desativado" };
        tracing::info!("👤 Usuário '{}' foi {}.", user.username, status);
        Ok(user)
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        ensure_admin(actor)?;
        ensure_not_self(actor, id, "excluir")?;

        self.user_repo.delete(id).await?;
        tracing::info!("🗑️ Usuário {} excluído por '{}'.", id, actor.username);
        Ok(())
    }

    /// Cria o primeiro administrador quando ainda não existe nenhum.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.has_admin().await? {
            return Ok(());
        }

        let hashed_password = hash_password(password).await?;
        let fields = UserFields { username: username.trim(), name: username.trim(), is_buyer: false, is_admin: true };
        let user = self.user_repo.create_user(&fields, &hashed_password).await?;

        tracing::info!("🔑 Administrador inicial '{}' criado.", user.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "maria".into(),
            name: "Maria da Silva".into(),
            password_hash: String::new(),
            is_buyer: false,
            is_admin,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_admins_manage_users() {
        assert!(ensure_admin(&user(true)).is_ok());
        assert!(matches!(ensure_admin(&user(false)), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn admin_cannot_disable_or_delete_itself() {
        let admin = user(true);
        let err = ensure_not_self(&admin, admin.id, "excluir").unwrap_err();
        assert_eq!(err.to_string(), "Você não pode excluir seu próprio usuário.");
        assert!(ensure_not_self(&admin, Uuid::new_v4(), "excluir").is_ok());
    }

    #[test]
    fn blank_search_lists_everyone() {
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(Some(" mar ")), Some("mar"));
    }

    // ---
    // Postgres
    // ---

    use sqlx::PgPool;

    async fn seed_admin(service: &UserService) -> User {
        let fields = UserFields { username: "admin", name: "Admin", is_buyer: false, is_admin: true };
        service.user_repo.create_user(&fields, "hash").await.unwrap()
    }

    #[sqlx::test]
    async fn admin_creates_lists_and_toggles_users(pool: PgPool) {
        let service = UserService::new(UserRepository::new(pool.clone()));
        let admin = seed_admin(&service).await;

        let fields = UserFields { username: " joao ", name: "João Comprador", is_buyer: true, is_admin: false };
        let joao = service.create(&admin, &fields, "senha123").await.unwrap();
        assert_eq!(joao.username, "joao");

        let page = service.list(&admin, Some("comprador"), None, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, joao.id);

        let toggled = service.toggle_active(&admin, joao.id).await.unwrap();
        assert!(!toggled.is_active);

        // Usuário comum não administra ninguém
        assert!(matches!(service.list(&joao, None, None, None).await, Err(AppError::Forbidden(_))));
        assert!(matches!(service.delete(&admin, admin.id).await, Err(AppError::Conflict(_))));

        service.delete(&admin, joao.id).await.unwrap();
        assert!(service.user_repo.find_any(joao.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn bootstrap_runs_only_once(pool: PgPool) {
        let service = UserService::new(UserRepository::new(pool.clone()));
        service.bootstrap_admin("root", "senha123").await.unwrap();
        service.bootstrap_admin("outro", "senha123").await.unwrap();

        let everyone = service.user_repo.list(None, 10, 0).await.unwrap();
        assert_eq!(everyone.len(), 1);
        assert!(everyone[0].is_admin);
    }
}
