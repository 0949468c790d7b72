// src/config.rs

pub mod settings;

pub use settings::Settings;

use crate::{
    common::i18n::I18nStore,
    db::{CatalogRepository, EmployeeRepository, OrganizationRepository, RbacRepository, UserRepository},
    services::{
        auth::AuthService, catalog_service::CatalogService, employee_service::EmployeeService,
        organization_service::OrganizationService, rbac_service::RbacService,
        user_service::UserService,
    },
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    // O extrator de permissões consulta o repositório direto
    pub rbac_repo: RbacRepository,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub rbac_service: RbacService,
    pub catalog_service: CatalogService,
    pub organization_service: OrganizationService,
    pub employee_service: EmployeeService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, settings))
    }

    // Monta o gráfico de dependências sobre um pool já criado
    pub fn from_pool(db_pool: PgPool, settings: Settings) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let organization_repo = OrganizationRepository::new(db_pool.clone());
        let employee_repo = EmployeeRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            rbac_repo.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_ttl_hours,
            settings.auth_guard.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone(), db_pool.clone());
        let rbac_service = RbacService::new(
            rbac_repo.clone(),
            user_repo.clone(),
            settings.auth_guard.clone(),
            db_pool.clone(),
        );
        let catalog_service = CatalogService::new(catalog_repo.clone());
        let organization_service =
            OrganizationService::new(organization_repo.clone(), catalog_repo.clone(), db_pool.clone());
        let employee_service = EmployeeService::new(
            employee_repo,
            user_repo,
            catalog_repo,
            organization_repo,
            db_pool.clone(),
        );

        Self {
            db_pool,
            settings: Arc::new(settings),
            i18n_store: Arc::new(I18nStore::new()),
            rbac_repo,
            auth_service,
            user_service,
            rbac_service,
            catalog_service,
            organization_service,
            employee_service,
        }
    }
}
