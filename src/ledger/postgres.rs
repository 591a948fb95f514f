use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::{
    config::LedgerLockStrategy,
    deliveries::models::{Delivery, NewDelivery},
    error::{AppResult, LedgerError},
    ledger::{
        reconciler::{ContractBalance, LedgerAdjustment},
        store::{LedgerStore, LedgerTx},
    },
};

const DELIVERY_COLUMNS: &str = "id, contract_id, batch_id, delivered_at, eggs_delivered, packaging, \
     vegetables, kitchen_gift, delivered_by, hen_delivered, notes, created_at, updated_at";

/// Postgres-backed ledger - contracts and deliveries live in the same database,
/// so one transaction covers both writes
pub struct PgLedgerStore {
    pool: PgPool,
    strategy: LedgerLockStrategy,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool, strategy: LedgerLockStrategy) -> Self {
        Self { pool, strategy }
    }

    pub fn strategy(&self) -> LedgerLockStrategy {
        self.strategy
    }
}

pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
    strategy: LedgerLockStrategy,
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> AppResult<PgLedgerTx> {
        Ok(PgLedgerTx {
            tx: self.pool.begin().await?,
            strategy: self.strategy,
        })
    }

    async fn list_deliveries(&self) -> AppResult<Vec<Delivery>> {
        let deliveries = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries ORDER BY delivered_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(deliveries)
    }

    async fn get_delivery(&self, delivery_id: i64) -> AppResult<Option<Delivery>> {
        let delivery = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = $1"
        ))
        .bind(delivery_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(delivery)
    }
}

impl PgLedgerTx {
    async fn fetch_contract(
        &mut self,
        contract_id: i64,
        lock: bool,
    ) -> AppResult<Option<ContractBalance>> {
        let sql = if lock {
            r#"
            SELECT id, total_eggs, remaining_eggs, hen_delivered
            FROM contracts
            WHERE id = $1
            FOR UPDATE
            "#
        } else {
            r#"
            SELECT id, total_eggs, remaining_eggs, hen_delivered
            FROM contracts
            WHERE id = $1
            "#
        };

        let row = sqlx::query_as::<_, (i64, i32, i32, bool)>(sql)
            .bind(contract_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(
            |(contract_id, total_eggs, remaining_eggs, hen_delivered)| ContractBalance {
                contract_id,
                total_eggs,
                remaining_eggs,
                hen_delivered,
            },
        ))
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn load_contract(&mut self, contract_id: i64) -> AppResult<Option<ContractBalance>> {
        let lock = self.strategy == LedgerLockStrategy::RowLock;
        self.fetch_contract(contract_id, lock).await
    }

    async fn lock_contract(&mut self, contract_id: i64) -> AppResult<Option<ContractBalance>> {
        self.fetch_contract(contract_id, true).await
    }

    async fn batch_contract_id(&mut self, batch_id: i64) -> AppResult<Option<i64>> {
        let contract_id = sqlx::query_scalar::<_, i64>("SELECT contract_id FROM batches WHERE id = $1")
            .bind(batch_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(contract_id)
    }

    async fn load_delivery(&mut self, delivery_id: i64) -> AppResult<Option<Delivery>> {
        let delivery = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = $1 FOR UPDATE"
        ))
        .bind(delivery_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(delivery)
    }

    async fn insert_delivery(&mut self, delivery: &NewDelivery) -> AppResult<Delivery> {
        let inserted = sqlx::query_as::<_, Delivery>(&format!(
            r#"
            INSERT INTO deliveries (
                contract_id, batch_id, delivered_at, eggs_delivered, packaging,
                vegetables, kitchen_gift, delivered_by, hen_delivered, notes
            )
            VALUES ($1, $2, COALESCE($3, NOW()), $4, $5, $6, $7, $8, $9, $10)
            RETURNING {DELIVERY_COLUMNS}
            "#
        ))
        .bind(delivery.contract_id)
        .bind(delivery.batch_id)
        .bind(delivery.delivered_at)
        .bind(delivery.eggs_delivered)
        .bind(&delivery.packaging)
        .bind(&delivery.vegetables)
        .bind(&delivery.kitchen_gift)
        .bind(&delivery.delivered_by)
        .bind(delivery.hen_delivered)
        .bind(&delivery.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(inserted)
    }

    async fn update_delivery(&mut self, delivery: &Delivery) -> AppResult<Delivery> {
        let updated = sqlx::query_as::<_, Delivery>(&format!(
            r#"
            UPDATE deliveries
            SET delivered_at = $2, eggs_delivered = $3, packaging = $4, vegetables = $5,
                kitchen_gift = $6, delivered_by = $7, hen_delivered = $8, notes = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DELIVERY_COLUMNS}
            "#
        ))
        .bind(delivery.id)
        .bind(delivery.delivered_at)
        .bind(delivery.eggs_delivered)
        .bind(&delivery.packaging)
        .bind(&delivery.vegetables)
        .bind(&delivery.kitchen_gift)
        .bind(&delivery.delivered_by)
        .bind(delivery.hen_delivered)
        .bind(&delivery.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(updated)
    }

    async fn delete_delivery(&mut self, delivery_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM deliveries WHERE id = $1")
            .bind(delivery_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn other_hen_delivery_exists(
        &mut self,
        contract_id: i64,
        excluding: i64,
    ) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM deliveries
                WHERE contract_id = $1 AND id <> $2 AND hen_delivered
            )
            "#,
        )
        .bind(contract_id)
        .bind(excluding)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn apply_adjustment(
        &mut self,
        contract_id: i64,
        adjustment: LedgerAdjustment,
    ) -> AppResult<()> {
        if adjustment.is_noop() {
            return Ok(());
        }

        let (write_hen, hen_value) = adjustment.hen_flag.as_update();

        // Guarded even under row locks, so the balance can never go negative
        // whatever the caller computed
        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET remaining_eggs = remaining_eggs - $2,
                hen_delivered = CASE WHEN $3 THEN $4 ELSE hen_delivered END,
                updated_at = NOW()
            WHERE id = $1 AND remaining_eggs - $2 >= 0
            "#,
        )
        .bind(contract_id)
        .bind(adjustment.debit)
        .bind(write_hen)
        .bind(hen_value)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            let remaining = sqlx::query_scalar::<_, i32>(
                "SELECT remaining_eggs FROM contracts WHERE id = $1",
            )
            .bind(contract_id)
            .fetch_optional(&mut *self.tx)
            .await?;

            return Err(match remaining {
                Some(remaining) => LedgerError::InsufficientBalance {
                    contract_id,
                    remaining: i64::from(remaining),
                    requested: i64::from(adjustment.debit),
                },
                None => LedgerError::ContractNotFound(contract_id),
            }
            .into());
        }

        debug!(
            contract_id,
            debit = adjustment.debit,
            strategy = ?self.strategy,
            "Contract ledger adjusted"
        );
        Ok(())
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
