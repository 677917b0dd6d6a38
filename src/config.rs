// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        DistributionRepository, EventRepository, GradeRepository, HistoryRepository, ItemRepository,
        UserRepository,
    },
    services::{
        allocation_service::AllocationService, auth::AuthService, catalog_service::CatalogService,
        event_service::EventService, export_service::ExportService, grade_service::GradeService,
        contract_service::ContractService, history_service::HistoryService, item_service::ItemService,
        reconciliation_service::ReconciliationService, user_service::UserService,
    },
    warehouse::{ClickHouseConfig, ClickHouseWarehouse, WarehouseGateway},
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub bind_addr: String,
    // Login e senha do primeiro administrador (ADMIN_USERNAME / ADMIN_PASSWORD)
    pub admin_seed: Option<(String, String)>,

    pub auth_service: AuthService,
    pub event_service: EventService,
    pub grade_service: GradeService,
    pub item_service: ItemService,
    pub allocation_service: AllocationService,
    pub history_service: HistoryService,
    pub reconciliation_service: ReconciliationService,
    pub export_service: ExportService,
    pub catalog_service: CatalogService,
    pub user_service: UserService,
    pub contract_service: ContractService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {}", raw))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        let admin_seed = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => Some((username, password)),
            _ => None,
        };

        let mut clickhouse = ClickHouseConfig::new(
            required("CLICKHOUSE_URL")?,
            env::var("CLICKHOUSE_DATABASE").unwrap_or_else(|_| "gold".to_string()),
        );
        if let (Ok(user), Ok(password)) = (env::var("CLICKHOUSE_USER"), env::var("CLICKHOUSE_PASSWORD")) {
            clickhouse = clickhouse.with_auth(user, password);
        }

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await
            .context("Falha ao conectar no Postgres")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let warehouse_client = ClickHouseWarehouse::new(&clickhouse);
        // O warehouse fora do ar não impede a subida; só a apuração e as buscas falham
        match warehouse_client.check_connection().await {
            Ok(()) => tracing::info!("✅ Warehouse ClickHouse acessível em {}", clickhouse.url),
            Err(e) => tracing::warn!("⚠️ Warehouse ClickHouse indisponível: {}", e),
        }
        let warehouse: Arc<dyn WarehouseGateway> = Arc::new(warehouse_client);

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let event_repo = EventRepository::new(db_pool.clone());
        let grade_repo = GradeRepository::new(db_pool.clone());
        let item_repo = ItemRepository::new(db_pool.clone());
        let distribution_repo = DistributionRepository::new(db_pool.clone());
        let history_repo = HistoryRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret);
        let user_service = UserService::new(user_repo);
        let event_service = EventService::new(db_pool.clone(), event_repo.clone());
        let grade_service = GradeService::new(
            db_pool.clone(),
            grade_repo.clone(),
            event_repo.clone(),
            item_repo.clone(),
        );
        let item_service = ItemService::new(db_pool.clone(), item_repo.clone(), grade_repo.clone());
        let allocation_service = AllocationService::new(
            db_pool.clone(),
            item_repo.clone(),
            grade_repo.clone(),
            distribution_repo.clone(),
            history_repo.clone(),
        );
        let history_service = HistoryService::new(db_pool.clone(), history_repo, warehouse.clone());
        let reconciliation_service = ReconciliationService::new(
            db_pool.clone(),
            grade_repo.clone(),
            event_repo.clone(),
            item_repo,
            distribution_repo.clone(),
            warehouse.clone(),
        );
        let export_service = ExportService::new(
            db_pool.clone(),
            grade_repo,
            event_repo,
            distribution_repo,
            reconciliation_service.clone(),
        );
        let catalog_service = CatalogService::new(warehouse.clone());
        let contract_service = ContractService::new(warehouse);

        Ok(Self {
            db_pool,
            bind_addr,
            admin_seed,
            auth_service,
            event_service,
            grade_service,
            item_service,
            allocation_service,
            history_service,
            reconciliation_service,
            export_service,
            catalog_service,
            user_service,
            contract_service,
        })
    }
}
