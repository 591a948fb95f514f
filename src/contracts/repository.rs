use sqlx::PgPool;

use crate::{
    contracts::models::{Contract, ContractPatch, NewContract},
    error::{AppError, AppResult},
};

const CONTRACT_COLUMNS: &str = "id, contract_code, customer_id, package_name, hen_type, egg_type, \
     total_eggs, remaining_eggs, price, start_date, status, hen_delivered, description, \
     created_at, updated_at";

pub struct ContractRepository {
    pub pool: PgPool,
}

impl ContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Contract>> {
        let contracts = sqlx::query_as::<_, Contract>(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }

    pub async fn get(&self, contract_id: i64) -> AppResult<Option<Contract>> {
        let contract = sqlx::query_as::<_, Contract>(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = $1"
        ))
        .bind(contract_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    pub async fn exists(&self, contract_id: i64) -> AppResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM contracts WHERE id = $1)")
                .bind(contract_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn code_taken(&self, contract_code: &str) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM contracts WHERE contract_code = $1)",
        )
        .bind(contract_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    pub async fn create(&self, contract: &NewContract, opening_balance: i32) -> AppResult<Contract> {
        sqlx::query_as::<_, Contract>(&format!(
            r#"
            INSERT INTO contracts (
                contract_code, customer_id, package_name, hen_type, egg_type,
                total_eggs, remaining_eggs, price, start_date, status,
                hen_delivered, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(&contract.contract_code)
        .bind(contract.customer_id)
        .bind(&contract.package_name)
        .bind(&contract.hen_type)
        .bind(&contract.egg_type)
        .bind(contract.total_eggs)
        .bind(opening_balance)
        .bind(contract.price)
        .bind(contract.start_date)
        .bind(&contract.status)
        .bind(contract.hen_delivered)
        .bind(&contract.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Contract code already exists"))
    }

    /// Writes descriptive columns only; the ledger columns are left to the delivery ledger
    pub async fn update(&self, contract_id: i64, patch: ContractPatch) -> AppResult<Option<Contract>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Contract>(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = $1 FOR UPDATE"
        ))
        .bind(contract_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut contract) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut contract);

        let updated = sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET package_name = $2, hen_type = $3, egg_type = $4, price = $5,
                start_date = $6, status = $7, description = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTRACT_COLUMNS}
            "#
        ))
        .bind(contract.id)
        .bind(&contract.package_name)
        .bind(&contract.hen_type)
        .bind(&contract.egg_type)
        .bind(contract.price)
        .bind(contract.start_date)
        .bind(&contract.status)
        .bind(&contract.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, contract_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(contract_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
