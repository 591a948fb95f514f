use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use crate::{
    api::handler::AppState,
    error::{AppError, AppResult},
    middleware::ValidatedJson,
    settlements::models::{
        NewSettlement, Settlement, SettlementPatch, TrialRequest, TrialSettlement,
    },
};

fn settlement_not_found() -> AppError {
    AppError::NotFound("Settlement not found".to_string())
}

fn contract_not_found() -> AppError {
    AppError::NotFound("Contract not found".to_string())
}

/// GET /settlements
pub async fn list_settlements(State(state): State<AppState>) -> AppResult<Json<Vec<Settlement>>> {
    Ok(Json(state.settlements.list().await?))
}

/// POST /settlements/trial
///
/// Computes what a settlement would look like; nothing is stored.
pub async fn trial_settlement(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<TrialRequest>,
) -> AppResult<Json<TrialSettlement>> {
    let contract = state
        .contracts
        .get(request.contract_id)
        .await?
        .ok_or_else(contract_not_found)?;

    let delivered = state.settlements.sum_eggs_delivered(contract.id).await?;
    let trial = TrialSettlement::compute(request, contract.price, contract.total_eggs, delivered)?;
    debug!(
        contract_id = contract.id,
        eggs = trial.eggs_delivered_total,
        amount_due = %trial.amount_due,
        "Trial settlement computed"
    );

    Ok(Json(trial))
}

/// POST /settlements
pub async fn create_settlement(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewSettlement>,
) -> AppResult<(StatusCode, Json<Settlement>)> {
    if !state.contracts.exists(request.contract_id).await? {
        return Err(contract_not_found());
    }

    let settlement = state.settlements.create(&request).await?;
    info!(
        contract_id = settlement.contract_id,
        amount_due = %settlement.amount_due,
        "Settlement {} created",
        settlement.id
    );

    Ok((StatusCode::CREATED, Json(settlement)))
}

/// GET /settlements/:id
pub async fn get_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<i64>,
) -> AppResult<Json<Settlement>> {
    let settlement = state
        .settlements
        .get(settlement_id)
        .await?
        .ok_or_else(settlement_not_found)?;

    Ok(Json(settlement))
}

/// PUT /settlements/:id
pub async fn update_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<SettlementPatch>,
) -> AppResult<Json<Settlement>> {
    let settlement = state
        .settlements
        .update(settlement_id, patch)
        .await?
        .ok_or_else(settlement_not_found)?;

    Ok(Json(settlement))
}

/// DELETE /settlements/:id
pub async fn delete_settlement(
    State(state): State<AppState>,
    Path(settlement_id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.settlements.delete(settlement_id).await? {
        return Err(settlement_not_found());
    }

    info!("Settlement {} deleted", settlement_id);
    Ok(StatusCode::NO_CONTENT)
}
