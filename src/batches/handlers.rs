use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    api::handler::AppState,
    batches::models::{Batch, BatchPatch, NewBatch},
    error::{AppError, AppResult},
    middleware::ValidatedJson,
};

fn batch_not_found() -> AppError {
    AppError::NotFound("Batch not found".to_string())
}

/// GET /batches
pub async fn list_batches(State(state): State<AppState>) -> AppResult<Json<Vec<Batch>>> {
    Ok(Json(state.batches.list().await?))
}

/// POST /batches
pub async fn create_batch(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewBatch>,
) -> AppResult<(StatusCode, Json<Batch>)> {
    if !state.contracts.exists(request.contract_id).await? {
        return Err(AppError::InvalidReference("Contract not found".to_string()));
    }

    let batch = state.batches.create(&request).await?;
    info!(
        contract_id = batch.contract_id,
        "Batch {} created ({})", batch.id, batch.name
    );

    Ok((StatusCode::CREATED, Json(batch)))
}

/// GET /batches/:id
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
) -> AppResult<Json<Batch>> {
    let batch = state
        .batches
        .get(batch_id)
        .await?
        .ok_or_else(batch_not_found)?;

    Ok(Json(batch))
}

/// PUT /batches/:id
pub async fn update_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<BatchPatch>,
) -> AppResult<Json<Batch>> {
    let batch = state
        .batches
        .update(batch_id, patch)
        .await?
        .ok_or_else(batch_not_found)?;

    Ok(Json(batch))
}

/// DELETE /batches/:id
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.batches.delete(batch_id).await? {
        return Err(batch_not_found());
    }

    info!("Batch {} deleted", batch_id);
    Ok(StatusCode::NO_CONTENT)
}
