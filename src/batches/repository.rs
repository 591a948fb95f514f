use sqlx::PgPool;

use crate::{
    batches::models::{Batch, BatchPatch, NewBatch},
    error::AppResult,
};

const BATCH_COLUMNS: &str =
    "id, contract_id, name, start_date, end_date, status, notes, created_at, updated_at";

pub struct BatchRepository {
    pub pool: PgPool,
}

impl BatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    pub async fn get(&self, batch_id: i64) -> AppResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1"
        ))
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    pub async fn exists(&self, batch_id: i64) -> AppResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM batches WHERE id = $1)")
                .bind(batch_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn create(&self, batch: &NewBatch) -> AppResult<Batch> {
        let created = sqlx::query_as::<_, Batch>(&format!(
            r#"
            INSERT INTO batches (contract_id, name, start_date, end_date, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(batch.contract_id)
        .bind(&batch.name)
        .bind(batch.start_date)
        .bind(batch.end_date)
        .bind(&batch.status)
        .bind(&batch.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update(&self, batch_id: i64, patch: BatchPatch) -> AppResult<Option<Batch>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1 FOR UPDATE"
        ))
        .bind(batch_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut batch) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut batch);

        let updated = sqlx::query_as::<_, Batch>(&format!(
            r#"
            UPDATE batches
            SET name = $2, start_date = $3, end_date = $4, status = $5, notes = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(batch.id)
        .bind(&batch.name)
        .bind(batch.start_date)
        .bind(batch.end_date)
        .bind(&batch.status)
        .bind(&batch.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Husbandry records are removed by cascade, deliveries lose their batch tag
    pub async fn delete(&self, batch_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM batches WHERE id = $1")
            .bind(batch_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
