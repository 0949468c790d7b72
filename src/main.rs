//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, nível info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let server_addr = settings.server_addr.clone();
    let run_migrations = settings.run_migrations;

    let app_state = AppState::new(settings).await?;

    if run_migrations {
        sqlx::migrate!()
            .run(&app_state.db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let app = routes::build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", server_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
