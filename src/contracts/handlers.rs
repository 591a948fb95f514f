use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    api::handler::AppState,
    contracts::models::{Contract, ContractPatch, ContractView, NewContract},
    error::{AppError, AppResult},
    middleware::ValidatedJson,
};

fn contract_not_found() -> AppError {
    AppError::NotFound("Contract not found".to_string())
}

async fn with_customer(state: &AppState, contract: Contract) -> AppResult<ContractView> {
    let customer = state.customers.get(contract.customer_id).await?;
    Ok(ContractView { contract, customer })
}

/// GET /contracts
pub async fn list_contracts(State(state): State<AppState>) -> AppResult<Json<Vec<ContractView>>> {
    let contracts = state.contracts.list().await?;

    let mut customer_ids: Vec<i64> = contracts.iter().map(|c| c.customer_id).collect();
    customer_ids.sort_unstable();
    customer_ids.dedup();

    let customers: HashMap<i64, _> = state
        .customers
        .get_many(&customer_ids)
        .await?
        .into_iter()
        .map(|customer| (customer.id, customer))
        .collect();

    let views = contracts
        .into_iter()
        .map(|contract| ContractView {
            customer: customers.get(&contract.customer_id).cloned(),
            contract,
        })
        .collect();

    Ok(Json(views))
}

/// POST /contracts
pub async fn create_contract(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewContract>,
) -> AppResult<(StatusCode, Json<ContractView>)> {
    if !state.customers.exists(request.customer_id).await? {
        return Err(AppError::InvalidReference("Customer not found".to_string()));
    }
    if state.contracts.code_taken(&request.contract_code).await? {
        return Err(AppError::Conflict("Contract code already exists".to_string()));
    }

    let opening_balance = request.opening_balance()?;
    let contract = state.contracts.create(&request, opening_balance).await?;
    info!(
        contract_id = contract.id,
        total_eggs = contract.total_eggs,
        remaining_eggs = contract.remaining_eggs,
        "Contract {} created",
        contract.contract_code
    );

    let view = with_customer(&state, contract).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /contracts/:id
pub async fn get_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<i64>,
) -> AppResult<Json<ContractView>> {
    let contract = state
        .contracts
        .get(contract_id)
        .await?
        .ok_or_else(contract_not_found)?;

    Ok(Json(with_customer(&state, contract).await?))
}

/// PUT /contracts/:id
pub async fn update_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<ContractPatch>,
) -> AppResult<Json<ContractView>> {
    let contract = state
        .contracts
        .update(contract_id, patch)
        .await?
        .ok_or_else(contract_not_found)?;

    Ok(Json(with_customer(&state, contract).await?))
}

/// DELETE /contracts/:id
///
/// Batches, deliveries and settlements go with it.
pub async fn delete_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.contracts.delete(contract_id).await? {
        return Err(contract_not_found());
    }

    info!("Contract {} deleted", contract_id);
    Ok(StatusCode::NO_CONTENT)
}
