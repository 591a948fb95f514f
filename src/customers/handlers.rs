use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    api::handler::AppState,
    customers::models::{Customer, CustomerPatch, NewCustomer},
    error::{AppError, AppResult},
    middleware::ValidatedJson,
};

fn customer_not_found() -> AppError {
    AppError::NotFound("Customer not found".to_string())
}

/// GET /customers
pub async fn list_customers(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    Ok(Json(state.customers.list().await?))
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewCustomer>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    if state.customers.code_taken(&request.customer_code).await? {
        return Err(AppError::Conflict("Customer code already exists".to_string()));
    }

    let customer = state.customers.create(&request).await?;
    info!("Customer {} created ({})", customer.id, customer.customer_code);

    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> AppResult<Json<Customer>> {
    let customer = state
        .customers
        .get(customer_id)
        .await?
        .ok_or_else(customer_not_found)?;

    Ok(Json(customer))
}

/// PUT /customers/:id
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<CustomerPatch>,
) -> AppResult<Json<Customer>> {
    if patch.area_code_too_long() {
        return Err(AppError::InvalidInput(
            "area_code: must be at most 10 characters".to_string(),
        ));
    }

    let customer = state
        .customers
        .update(customer_id, patch)
        .await?
        .ok_or_else(customer_not_found)?;

    Ok(Json(customer))
}

/// DELETE /customers/:id
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.customers.delete(customer_id).await? {
        return Err(customer_not_found());
    }

    info!("Customer {} deleted", customer_id);
    Ok(StatusCode::NO_CONTENT)
}
