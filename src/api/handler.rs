use std::sync::Arc;

use axum::Json;
use serde::Serialize;

use crate::{
    batches::BatchRepository, config::Config, contracts::ContractRepository,
    customers::CustomerRepository, deliveries::DeliveryService, husbandry::HusbandryRepository,
    ledger::PgLedgerStore, settlements::SettlementRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub customers: Arc<CustomerRepository>,
    pub contracts: Arc<ContractRepository>,
    pub batches: Arc<BatchRepository>,
    pub husbandry: Arc<HusbandryRepository>,
    pub settlements: Arc<SettlementRepository>,
    /// Every delivery write goes through the ledger
    pub deliveries: Arc<DeliveryService<PgLedgerStore>>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Liveness probe
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Henhouse egg subscription backend",
    })
}
