use async_trait::async_trait;

use crate::{
    deliveries::models::{Delivery, NewDelivery},
    error::AppResult,
    ledger::reconciler::{ContractBalance, LedgerAdjustment},
};

/// One unit of work against the ledger tables.
///
/// Everything done through a `LedgerTx` becomes visible together on
/// [`LedgerTx::commit`]; dropping it without committing discards it.
#[async_trait]
pub trait LedgerTx: Send {
    /// Load the ledger fields of a contract, locking them when the store's
    /// strategy calls for it
    async fn load_contract(&mut self, contract_id: i64) -> AppResult<Option<ContractBalance>>;

    /// Load the ledger fields of a contract and hold its row lock until the
    /// unit of work ends, whatever the store's strategy
    async fn lock_contract(&mut self, contract_id: i64) -> AppResult<Option<ContractBalance>>;

    /// Contract owning the batch, `None` if the batch does not exist
    async fn batch_contract_id(&mut self, batch_id: i64) -> AppResult<Option<i64>>;

    /// Load a delivery and lock it for the rest of the unit of work
    async fn load_delivery(&mut self, delivery_id: i64) -> AppResult<Option<Delivery>>;

    async fn insert_delivery(&mut self, delivery: &NewDelivery) -> AppResult<Delivery>;

    async fn update_delivery(&mut self, delivery: &Delivery) -> AppResult<Delivery>;

    async fn delete_delivery(&mut self, delivery_id: i64) -> AppResult<()>;

    /// Whether any delivery of the contract other than `excluding` carries the hen
    async fn other_hen_delivery_exists(&mut self, contract_id: i64, excluding: i64)
        -> AppResult<bool>;

    /// Write an adjustment; fails with `InsufficientBalance` if the stored
    /// balance cannot absorb the debit
    async fn apply_adjustment(
        &mut self,
        contract_id: i64,
        adjustment: LedgerAdjustment,
    ) -> AppResult<()>;

    async fn commit(self) -> AppResult<()>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    async fn begin(&self) -> AppResult<Self::Tx>;

    async fn list_deliveries(&self) -> AppResult<Vec<Delivery>>;

    async fn get_delivery(&self, delivery_id: i64) -> AppResult<Option<Delivery>>;
}
