//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
mod warehouse;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug,sqlx=warn etc.; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some((username, password)) = &app_state.admin_seed {
        app_state
            .user_service
            .bootstrap_admin(username, password)
            .await
            .context("Falha ao criar o administrador inicial.")?;
    }

    let bind_addr = app_state.bind_addr.clone();
    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .context("Erro no servidor Axum")?;
    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Só o login é público; usuários são cadastrados por administradores
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/"
               ,get(handlers::users::list_users)
               .post(handlers::users::create_user)
        )
        .route("/me", get(handlers::auth::get_me))
        .route("/buyers", get(handlers::auth::list_buyers))
        .route("/{id}"
               ,put(handlers::users::update_user)
               .delete(handlers::users::delete_user)
        )
        .route("/{id}/toggle-status", post(handlers::users::toggle_user_status));

    let event_routes = Router::new()
        .route("/"
               ,get(handlers::events::list_events)
               .post(handlers::events::create_event)
        )
        .route("/{id}"
               ,put(handlers::events::update_event)
               .delete(handlers::events::delete_event)
        );

    let grade_routes = Router::new()
        .route("/"
               ,get(handlers::grades::list_grades)
               .post(handlers::grades::create_grade)
        )
        .route("/{id}"
               ,get(handlers::grades::get_grade)
               .put(handlers::grades::update_grade)
               .delete(handlers::grades::delete_grade)
        )
        .route("/{id}/finalize", post(handlers::grades::finalize_grade))
        .route("/{id}/dashboard", get(handlers::grades::get_dashboard))
        .route("/{id}/export", get(handlers::grades::export_grade))
        .route("/{id}/items", post(handlers::items::create_item));

    let item_routes = Router::new()
        .route("/{id}"
               ,get(handlers::items::get_item)
               .put(handlers::items::update_item)
               .delete(handlers::items::delete_item)
        )
        .route("/{id}/distribution"
               ,get(handlers::items::get_distribution)
               .put(handlers::items::save_distribution)
        );

    let history_routes = Router::new()
        .route("/refresh", post(handlers::history::refresh_history));

    let catalog_routes = Router::new()
        .route("/products", get(handlers::catalog::search_products))
        .route("/supplier-groups", get(handlers::catalog::search_supplier_groups));

    let contract_routes = Router::new()
        .route("/", get(handlers::contracts::list_contracts))
        .route("/{subcontract}", get(handlers::contracts::contract_detail));

    // Tudo abaixo exige o token
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/events", event_routes)
        .nest("/grades", grade_routes)
        .nest("/items", item_routes)
        .nest("/history", history_routes)
        .nest("/catalog", catalog_routes)
        .nest("/contracts", contract_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .with_state(app_state)
}
