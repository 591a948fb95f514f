use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::{
    error::AppResult,
    husbandry::models::{
        Feeding, FeedingPatch, Medication, MedicationPatch, NewFeeding, NewMedication,
        NewRearingPlan, NewWeighing, RearingPlan, RearingPlanPatch, Weighing, WeighingPatch,
    },
};

const REARING_PLAN_COLUMNS: &str =
    "id, batch_id, scheduled_date, activity, feed_amount, notes, created_at, updated_at";
const FEEDING_COLUMNS: &str =
    "id, batch_id, feed_type, quantity_kg, fed_at, notes, created_at, updated_at";
const MEDICATION_COLUMNS: &str =
    "id, batch_id, medication_name, dosage, administered_at, notes, created_at, updated_at";
const WEIGHING_COLUMNS: &str =
    "id, batch_id, weight_kg, recorded_at, notes, created_at, updated_at";

/// Storage for rearing plans, feedings, medications and weighings
pub struct HusbandryRepository {
    pub pool: PgPool,
}

impl HusbandryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all<T>(&self, sql: &str) -> AppResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Ok(sqlx::query_as::<_, T>(sql).fetch_all(&self.pool).await?)
    }

    async fn fetch_by_id<T>(&self, sql: &str, id: i64) -> AppResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Ok(sqlx::query_as::<_, T>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_from(&self, table: &str, id: i64) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Rearing plans

    pub async fn list_rearing_plans(&self) -> AppResult<Vec<RearingPlan>> {
        self.fetch_all(&format!(
            "SELECT {REARING_PLAN_COLUMNS} FROM rearing_plans ORDER BY scheduled_date, id"
        ))
        .await
    }

    pub async fn get_rearing_plan(&self, plan_id: i64) -> AppResult<Option<RearingPlan>> {
        self.fetch_by_id(
            &format!("SELECT {REARING_PLAN_COLUMNS} FROM rearing_plans WHERE id = $1"),
            plan_id,
        )
        .await
    }

    pub async fn create_rearing_plan(&self, plan: &NewRearingPlan) -> AppResult<RearingPlan> {
        let created = sqlx::query_as::<_, RearingPlan>(&format!(
            r#"
            INSERT INTO rearing_plans (batch_id, scheduled_date, activity, feed_amount, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REARING_PLAN_COLUMNS}
            "#
        ))
        .bind(plan.batch_id)
        .bind(plan.scheduled_date)
        .bind(&plan.activity)
        .bind(plan.feed_amount)
        .bind(&plan.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update_rearing_plan(
        &self,
        plan_id: i64,
        patch: RearingPlanPatch,
    ) -> AppResult<Option<RearingPlan>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, RearingPlan>(&format!(
            "SELECT {REARING_PLAN_COLUMNS} FROM rearing_plans WHERE id = $1 FOR UPDATE"
        ))
        .bind(plan_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut plan) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut plan);

        let updated = sqlx::query_as::<_, RearingPlan>(&format!(
            r#"
            UPDATE rearing_plans
            SET scheduled_date = $2, activity = $3, feed_amount = $4, notes = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REARING_PLAN_COLUMNS}
            "#
        ))
        .bind(plan.id)
        .bind(plan.scheduled_date)
        .bind(&plan.activity)
        .bind(plan.feed_amount)
        .bind(&plan.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete_rearing_plan(&self, plan_id: i64) -> AppResult<bool> {
        self.delete_from("rearing_plans", plan_id).await
    }

    // Feedings

    pub async fn list_feedings(&self) -> AppResult<Vec<Feeding>> {
        self.fetch_all(&format!(
            "SELECT {FEEDING_COLUMNS} FROM feedings ORDER BY fed_at DESC, id DESC"
        ))
        .await
    }

    pub async fn get_feeding(&self, feeding_id: i64) -> AppResult<Option<Feeding>> {
        self.fetch_by_id(
            &format!("SELECT {FEEDING_COLUMNS} FROM feedings WHERE id = $1"),
            feeding_id,
        )
        .await
    }

    pub async fn create_feeding(&self, feeding: &NewFeeding) -> AppResult<Feeding> {
        let created = sqlx::query_as::<_, Feeding>(&format!(
            r#"
            INSERT INTO feedings (batch_id, feed_type, quantity_kg, fed_at, notes)
            VALUES ($1, $2, $3, COALESCE($4, NOW()), $5)
            RETURNING {FEEDING_COLUMNS}
            "#
        ))
        .bind(feeding.batch_id)
        .bind(&feeding.feed_type)
        .bind(feeding.quantity_kg)
        .bind(feeding.fed_at)
        .bind(&feeding.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update_feeding(
        &self,
        feeding_id: i64,
        patch: FeedingPatch,
    ) -> AppResult<Option<Feeding>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Feeding>(&format!(
            "SELECT {FEEDING_COLUMNS} FROM feedings WHERE id = $1 FOR UPDATE"
        ))
        .bind(feeding_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut feeding) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut feeding);

        let updated = sqlx::query_as::<_, Feeding>(&format!(
            r#"
            UPDATE feedings
            SET feed_type = $2, quantity_kg = $3, fed_at = $4, notes = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {FEEDING_COLUMNS}
            "#
        ))
        .bind(feeding.id)
        .bind(&feeding.feed_type)
        .bind(feeding.quantity_kg)
        .bind(feeding.fed_at)
        .bind(&feeding.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete_feeding(&self, feeding_id: i64) -> AppResult<bool> {
        self.delete_from("feedings", feeding_id).await
    }

    // Medications

    pub async fn list_medications(&self) -> AppResult<Vec<Medication>> {
        self.fetch_all(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications ORDER BY administered_at DESC, id DESC"
        ))
        .await
    }

    pub async fn get_medication(&self, medication_id: i64) -> AppResult<Option<Medication>> {
        self.fetch_by_id(
            &format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = $1"),
            medication_id,
        )
        .await
    }

    pub async fn create_medication(&self, medication: &NewMedication) -> AppResult<Medication> {
        let created = sqlx::query_as::<_, Medication>(&format!(
            r#"
            INSERT INTO medications (batch_id, medication_name, dosage, administered_at, notes)
            VALUES ($1, $2, $3, COALESCE($4, NOW()), $5)
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(medication.batch_id)
        .bind(&medication.medication_name)
        .bind(&medication.dosage)
        .bind(medication.administered_at)
        .bind(&medication.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update_medication(
        &self,
        medication_id: i64,
        patch: MedicationPatch,
    ) -> AppResult<Option<Medication>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Medication>(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = $1 FOR UPDATE"
        ))
        .bind(medication_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut medication) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut medication);

        let updated = sqlx::query_as::<_, Medication>(&format!(
            r#"
            UPDATE medications
            SET medication_name = $2, dosage = $3, administered_at = $4, notes = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(medication.id)
        .bind(&medication.medication_name)
        .bind(&medication.dosage)
        .bind(medication.administered_at)
        .bind(&medication.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete_medication(&self, medication_id: i64) -> AppResult<bool> {
        self.delete_from("medications", medication_id).await
    }

    // Weighings

    pub async fn list_weighings(&self) -> AppResult<Vec<Weighing>> {
        self.fetch_all(&format!(
            "SELECT {WEIGHING_COLUMNS} FROM weighings ORDER BY recorded_at DESC, id DESC"
        ))
        .await
    }

    pub async fn get_weighing(&self, weighing_id: i64) -> AppResult<Option<Weighing>> {
        self.fetch_by_id(
            &format!("SELECT {WEIGHING_COLUMNS} FROM weighings WHERE id = $1"),
            weighing_id,
        )
        .await
    }

    pub async fn create_weighing(&self, weighing: &NewWeighing) -> AppResult<Weighing> {
        let created = sqlx::query_as::<_, Weighing>(&format!(
            r#"
            INSERT INTO weighings (batch_id, weight_kg, recorded_at, notes)
            VALUES ($1, $2, COALESCE($3, NOW()), $4)
            RETURNING {WEIGHING_COLUMNS}
            "#
        ))
        .bind(weighing.batch_id)
        .bind(weighing.weight_kg)
        .bind(weighing.recorded_at)
        .bind(&weighing.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update_weighing(
        &self,
        weighing_id: i64,
        patch: WeighingPatch,
    ) -> AppResult<Option<Weighing>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Weighing>(&format!(
            "SELECT {WEIGHING_COLUMNS} FROM weighings WHERE id = $1 FOR UPDATE"
        ))
        .bind(weighing_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut weighing) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut weighing);

        let updated = sqlx::query_as::<_, Weighing>(&format!(
            r#"
            UPDATE weighings
            SET weight_kg = $2, recorded_at = $3, notes = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {WEIGHING_COLUMNS}
            "#
        ))
        .bind(weighing.id)
        .bind(weighing.weight_kg)
        .bind(weighing.recorded_at)
        .bind(&weighing.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete_weighing(&self, weighing_id: i64) -> AppResult<bool> {
        self.delete_from("weighings", weighing_id).await
    }
}
