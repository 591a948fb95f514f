use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    api::handler::AppState,
    error::{AppError, AppResult},
    husbandry::models::{
        Feeding, FeedingPatch, Medication, MedicationPatch, NewFeeding, NewMedication,
        NewRearingPlan, NewWeighing, RearingPlan, RearingPlanPatch, Weighing, WeighingPatch,
    },
    middleware::ValidatedJson,
};

async fn ensure_batch(state: &AppState, batch_id: i64) -> AppResult<()> {
    if !state.batches.exists(batch_id).await? {
        return Err(AppError::InvalidReference("Batch not found".to_string()));
    }
    Ok(())
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{what} not found"))
}

fn deleted(found: bool, what: &str) -> AppResult<StatusCode> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(what))
    }
}

/// GET /rearing-plans
pub async fn list_rearing_plans(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RearingPlan>>> {
    Ok(Json(state.husbandry.list_rearing_plans().await?))
}

/// POST /rearing-plans
pub async fn create_rearing_plan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewRearingPlan>,
) -> AppResult<(StatusCode, Json<RearingPlan>)> {
    ensure_batch(&state, request.batch_id).await?;
    let plan = state.husbandry.create_rearing_plan(&request).await?;
    info!(batch_id = plan.batch_id, "Rearing plan {} created", plan.id);
    Ok((StatusCode::CREATED, Json(plan)))
}

/// GET /rearing-plans/:id
pub async fn get_rearing_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<i64>,
) -> AppResult<Json<RearingPlan>> {
    let plan = state
        .husbandry
        .get_rearing_plan(plan_id)
        .await?
        .ok_or_else(|| not_found("Rearing plan"))?;
    Ok(Json(plan))
}

/// PUT /rearing-plans/:id
pub async fn update_rearing_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<RearingPlanPatch>,
) -> AppResult<Json<RearingPlan>> {
    let plan = state
        .husbandry
        .update_rearing_plan(plan_id, patch)
        .await?
        .ok_or_else(|| not_found("Rearing plan"))?;
    Ok(Json(plan))
}

/// DELETE /rearing-plans/:id
pub async fn delete_rearing_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(
        state.husbandry.delete_rearing_plan(plan_id).await?,
        "Rearing plan",
    )
}

/// GET /feedings
pub async fn list_feedings(State(state): State<AppState>) -> AppResult<Json<Vec<Feeding>>> {
    Ok(Json(state.husbandry.list_feedings().await?))
}

/// POST /feedings
pub async fn create_feeding(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewFeeding>,
) -> AppResult<(StatusCode, Json<Feeding>)> {
    ensure_batch(&state, request.batch_id).await?;
    let feeding = state.husbandry.create_feeding(&request).await?;
    info!(batch_id = feeding.batch_id, "Feeding {} recorded", feeding.id);
    Ok((StatusCode::CREATED, Json(feeding)))
}

/// GET /feedings/:id
pub async fn get_feeding(
    State(state): State<AppState>,
    Path(feeding_id): Path<i64>,
) -> AppResult<Json<Feeding>> {
    let feeding = state
        .husbandry
        .get_feeding(feeding_id)
        .await?
        .ok_or_else(|| not_found("Feeding record"))?;
    Ok(Json(feeding))
}

/// PUT /feedings/:id
pub async fn update_feeding(
    State(state): State<AppState>,
    Path(feeding_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<FeedingPatch>,
) -> AppResult<Json<Feeding>> {
    let feeding = state
        .husbandry
        .update_feeding(feeding_id, patch)
        .await?
        .ok_or_else(|| not_found("Feeding record"))?;
    Ok(Json(feeding))
}

/// DELETE /feedings/:id
pub async fn delete_feeding(
    State(state): State<AppState>,
    Path(feeding_id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(
        state.husbandry.delete_feeding(feeding_id).await?,
        "Feeding record",
    )
}

/// GET /medications
pub async fn list_medications(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Medication>>> {
    Ok(Json(state.husbandry.list_medications().await?))
}

/// POST /medications
pub async fn create_medication(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewMedication>,
) -> AppResult<(StatusCode, Json<Medication>)> {
    ensure_batch(&state, request.batch_id).await?;
    let medication = state.husbandry.create_medication(&request).await?;
    info!(
        batch_id = medication.batch_id,
        "Medication {} recorded ({})", medication.id, medication.medication_name
    );
    Ok((StatusCode::CREATED, Json(medication)))
}

/// GET /medications/:id
pub async fn get_medication(
    State(state): State<AppState>,
    Path(medication_id): Path<i64>,
) -> AppResult<Json<Medication>> {
    let medication = state
        .husbandry
        .get_medication(medication_id)
        .await?
        .ok_or_else(|| not_found("Medication record"))?;
    Ok(Json(medication))
}

/// PUT /medications/:id
pub async fn update_medication(
    State(state): State<AppState>,
    Path(medication_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<MedicationPatch>,
) -> AppResult<Json<Medication>> {
    let medication = state
        .husbandry
        .update_medication(medication_id, patch)
        .await?
        .ok_or_else(|| not_found("Medication record"))?;
    Ok(Json(medication))
}

/// DELETE /medications/:id
pub async fn delete_medication(
    State(state): State<AppState>,
    Path(medication_id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(
        state.husbandry.delete_medication(medication_id).await?,
        "Medication record",
    )
}

/// GET /weighings
pub async fn list_weighings(State(state): State<AppState>) -> AppResult<Json<Vec<Weighing>>> {
    Ok(Json(state.husbandry.list_weighings().await?))
}

/// POST /weighings
pub async fn create_weighing(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewWeighing>,
) -> AppResult<(StatusCode, Json<Weighing>)> {
    ensure_batch(&state, request.batch_id).await?;
    let weighing = state.husbandry.create_weighing(&request).await?;
    info!(batch_id = weighing.batch_id, "Weighing {} recorded", weighing.id);
    Ok((StatusCode::CREATED, Json(weighing)))
}

/// GET /weighings/:id
pub async fn get_weighing(
    State(state): State<AppState>,
    Path(weighing_id): Path<i64>,
) -> AppResult<Json<Weighing>> {
    let weighing = state
        .husbandry
        .get_weighing(weighing_id)
        .await?
        .ok_or_else(|| not_found("Weighing record"))?;
    Ok(Json(weighing))
}

/// PUT /weighings/:id
pub async fn update_weighing(
    State(state): State<AppState>,
    Path(weighing_id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<WeighingPatch>,
) -> AppResult<Json<Weighing>> {
    let weighing = state
        .husbandry
        .update_weighing(weighing_id, patch)
        .await?
        .ok_or_else(|| not_found("Weighing record"))?;
    Ok(Json(weighing))
}

/// DELETE /weighings/:id
pub async fn delete_weighing(
    State(state): State<AppState>,
    Path(weighing_id): Path<i64>,
) -> AppResult<StatusCode> {
    deleted(
        state.husbandry.delete_weighing(weighing_id).await?,
        "Weighing record",
    )
}
