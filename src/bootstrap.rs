use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::{
    api::handler::AppState, batches::BatchRepository, config::Config,
    contracts::ContractRepository, customers::CustomerRepository, deliveries::DeliveryService,
    error::AppResult, husbandry::HusbandryRepository, ledger::PgLedgerStore,
    settlements::SettlementRepository,
};

pub async fn initialize_app_state(config: Arc<Config>) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config).await?;
    Ok(build_state(config, pool))
}

/// Wire repositories and the delivery ledger around an existing pool
pub fn build_state(config: Arc<Config>, pool: PgPool) -> AppState {
    let ledger = PgLedgerStore::new(pool.clone(), config.ledger_lock_strategy);
    info!("🔒 Contract ledger using {:?} strategy", ledger.strategy());

    AppState {
        customers: Arc::new(CustomerRepository::new(pool.clone())),
        contracts: Arc::new(ContractRepository::new(pool.clone())),
        batches: Arc::new(BatchRepository::new(pool.clone())),
        husbandry: Arc::new(HusbandryRepository::new(pool.clone())),
        settlements: Arc::new(SettlementRepository::new(pool)),
        deliveries: Arc::new(DeliveryService::new(ledger)),
        config,
    }
}

async fn initialize_database(config: &Config) -> AppResult<PgPool> {
    info!("📊 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout())
        .connect(&config.database_url)
        .await?;

    info!(
        "✓ Database pool configured: {} max connections",
        config.db_max_connections
    );

    info!("🔄 Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("✓ Database initialized");
    Ok(pool)
}
