use sqlx::PgPool;

use crate::{
    customers::models::{Customer, CustomerPatch, NewCustomer},
    error::{AppError, AppResult},
};

const CUSTOMER_COLUMNS: &str = "id, customer_code, name, phones, recipient_name, address, \
     area_code, first_purchase_date, notes, created_at, updated_at";

pub struct CustomerRepository {
    pub pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn get(&self, customer_id: i64) -> AppResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn get_many(&self, customer_ids: &[i64]) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ANY($1)"
        ))
        .bind(customer_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn exists(&self, customer_id: i64) -> AppResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                .bind(customer_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn code_taken(&self, customer_code: &str) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE customer_code = $1)",
        )
        .bind(customer_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    pub async fn create(&self, customer: &NewCustomer) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (
                customer_code, name, phones, recipient_name, address,
                area_code, first_purchase_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&customer.customer_code)
        .bind(&customer.name)
        .bind(&customer.phones)
        .bind(&customer.recipient_name)
        .bind(&customer.address)
        .bind(&customer.area_code)
        .bind(customer.first_purchase_date)
        .bind(&customer.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Customer code already exists"))
    }

    pub async fn update(&self, customer_id: i64, patch: CustomerPatch) -> AppResult<Option<Customer>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 FOR UPDATE"
        ))
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut customer) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut customer);

        let updated = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = $2, phones = $3, recipient_name = $4, address = $5,
                area_code = $6, first_purchase_date = $7, notes = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phones)
        .bind(&customer.recipient_name)
        .bind(&customer.address)
        .bind(&customer.area_code)
        .bind(customer.first_purchase_date)
        .bind(&customer.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Removes the customer and, through `ON DELETE CASCADE`, everything under its contracts
    pub async fn delete(&self, customer_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
