use sqlx::PgPool;

use crate::{
    error::AppResult,
    settlements::models::{NewSettlement, Settlement, SettlementPatch},
};

const SETTLEMENT_COLUMNS: &str = "id, contract_id, settlement_date, eggs_delivered_total, \
     amount_due, amount_paid, status, is_trial, notes, created_at, updated_at";

pub struct SettlementRepository {
    pub pool: PgPool,
}

impl SettlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Settlement>> {
        let settlements = sqlx::query_as::<_, Settlement>(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements ORDER BY settlement_date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(settlements)
    }

    pub async fn get(&self, settlement_id: i64) -> AppResult<Option<Settlement>> {
        let settlement = sqlx::query_as::<_, Settlement>(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE id = $1"
        ))
        .bind(settlement_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settlement)
    }

    /// Stored settlements are never trials
    pub async fn create(&self, settlement: &NewSettlement) -> AppResult<Settlement> {
        let created = sqlx::query_as::<_, Settlement>(&format!(
            r#"
            INSERT INTO settlements (
                contract_id, settlement_date, eggs_delivered_total, amount_due,
                amount_paid, status, is_trial, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
            RETURNING {SETTLEMENT_COLUMNS}
            "#
        ))
        .bind(settlement.contract_id)
        .bind(settlement.settlement_date)
        .bind(settlement.eggs_delivered_total)
        .bind(settlement.amount_due)
        .bind(settlement.amount_paid)
        .bind(&settlement.status)
        .bind(&settlement.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update(
        &self,
        settlement_id: i64,
        patch: SettlementPatch,
    ) -> AppResult<Option<Settlement>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Settlement>(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE id = $1 FOR UPDATE"
        ))
        .bind(settlement_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut settlement) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut settlement);

        let updated = sqlx::query_as::<_, Settlement>(&format!(
            r#"
            UPDATE settlements
            SET settlement_date = $2, eggs_delivered_total = $3, amount_due = $4,
                amount_paid = $5, status = $6, is_trial = $7, notes = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {SETTLEMENT_COLUMNS}
            "#
        ))
        .bind(settlement.id)
        .bind(settlement.settlement_date)
        .bind(settlement.eggs_delivered_total)
        .bind(settlement.amount_due)
        .bind(settlement.amount_paid)
        .bind(&settlement.status)
        .bind(settlement.is_trial)
        .bind(&settlement.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, settlement_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM settlements WHERE id = $1")
            .bind(settlement_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total eggs recorded against a contract, zero when nothing was delivered
    pub async fn sum_eggs_delivered(&self, contract_id: i64) -> AppResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(eggs_delivered), 0)::BIGINT FROM deliveries WHERE contract_id = $1",
        )
        .bind(contract_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
