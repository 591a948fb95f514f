use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::handler::AppState,
    deliveries::models::{Delivery, DeliveryPatch, NewDelivery, DETAIL_MAX_CHARS},
    error::{AppError, AppResult},
    middleware::ValidatedJson,
};

/// GET /deliveries
pub async fn list_deliveries(State(state): State<AppState>) -> AppResult<Json<Vec<Delivery>>> {
    Ok(Json(state.deliveries.list().await?))
}

/// POST /deliveries
///
/// Debits the contract balance; overdrawing it is rejected with `INSUFFICIENT_BALANCE`.
pub async fn create_delivery(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewDelivery>,
) -> AppResult<(StatusCode, Json<Delivery>)> {
    let delivery = state.deliveries.create(request).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

/// GET /deliveries/:id
pub async fn get_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<i64>,
) -> AppResult<Json<Delivery>> {
    Ok(Json(state.deliveries.get(delivery_id).await?))
}

/// PUT /deliveries/:id
pub async fn update_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<DeliveryPatch>,
) -> AppResult<Json<Delivery>> {
    if let Some(field) = patch.overlong_detail() {
        return Err(AppError::InvalidInput(format!(
            "{}: must be at most {} characters",
            field, DETAIL_MAX_CHARS
        )));
    }

    Ok(Json(state.deliveries.amend(delivery_id, patch).await?))
}

/// DELETE /deliveries/:id
pub async fn delete_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.deliveries.remove(delivery_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
