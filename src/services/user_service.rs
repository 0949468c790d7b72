// src/services/user_service.rs

use sqlx::PgPool;

use crate::{
    common::{
        error::{AppError, Resource},
        query::{PageRequest, Paginated},
    },
    db::UserRepository,
    models::{
        auth::{LoginLocation, User},
        users::{CreateUserPayload, UpdateUserPayload},
    },
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Paginated<User>, AppError> {
        let (users, total) = self.repo.list(page).await?;
        Ok(Paginated::new(users, page, total))
    }

    pub async fn get(&self, id: i64) -> Result<User, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Resource::User))
    }

    pub async fn create(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        if self.repo.email_taken(&payload.email, None).await? {
            return Err(AppError::field("email", "taken"));
        }

        let password_hash = hash_password(&payload.password).await?;
        let user = self
            .repo
            .create_user(&self.pool, &payload.name, &payload.email, &password_hash)
            .await?;

        tracing::info!(user_id = user.id, "usuário criado pelo administrador");
        Ok(user)
    }

    pub async fn update(&self, id: i64, payload: &UpdateUserPayload) -> Result<User, AppError> {
        let mut user = self.get(id).await?;

        if let Some(email) = &payload.email {
            if self.repo.email_taken(email, Some(id)).await? {
                return Err(AppError::field("email", "taken"));
            }
        }

        let password_hash = match &payload.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        payload.apply_to(&mut user, password_hash);
        self.repo.update_user(&user).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.repo.delete_user(id).await? == 0 {
            return Err(AppError::NotFound(Resource::User));
        }
        tracing::info!(user_id = id, "usuário removido");
        Ok(())
    }

    pub async fn login_locations(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Paginated<LoginLocation>, AppError> {
        if !self.repo.exists(user_id).await? {
            return Err(AppError::NotFound(Resource::User));
        }
        let (locations, total) = self.repo.list_login_locations(user_id, page).await?;
        Ok(Paginated::new(locations, page, total))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::services::fixtures;

    #[sqlx::test(migrations = "./migrations")]
    async fn created_user_reads_back_and_email_is_unique(pool: PgPool) {
        let service = fixtures::state(pool).user_service;
        let payload = CreateUserPayload {
            name: "Ana Torres".into(),
            email: "ana@finca.co".into(),
            password: "Secreta#2024".into(),
        };

        let user = service.create(&payload).await.unwrap();
        assert_ne!(user.password_hash, "Secreta#2024");
        assert_eq!(service.get(user.id).await.unwrap().email, "ana@finca.co");

        let error = service.create(&payload).await.unwrap_err();
        assert_eq!(fixtures::field_errors(error)["email"], vec!["taken"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_a_missing_user_is_404(pool: PgPool) {
        let service = fixtures::state(pool).user_service;
        assert!(matches!(
            service.delete(9_999).await,
            Err(AppError::NotFound(Resource::User))
        ));
    }
}
