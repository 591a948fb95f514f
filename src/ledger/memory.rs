use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    deliveries::models::{Delivery, NewDelivery},
    error::{AppError, AppResult, LedgerError},
    ledger::{
        reconciler::{ContractBalance, LedgerAdjustment},
        store::{LedgerStore, LedgerTx},
    },
};

#[derive(Clone, Default)]
struct LedgerState {
    contracts: HashMap<i64, ContractBalance>,
    /// batch id -> owning contract id
    batches: HashMap<i64, i64>,
    deliveries: BTreeMap<i64, Delivery>,
    next_delivery_id: i64,
}

/// In-process ledger. Units of work are serialised by one async mutex and work
/// on a private copy that replaces the shared state on commit.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_contract(&self, contract_id: i64, total_eggs: i32, remaining_eggs: i32) {
        let mut state = self.state.lock().await;
        state.contracts.insert(
            contract_id,
            ContractBalance {
                contract_id,
                total_eggs,
                remaining_eggs,
                hen_delivered: false,
            },
        );
    }

    pub async fn add_batch(&self, batch_id: i64, contract_id: i64) {
        self.state.lock().await.batches.insert(batch_id, contract_id);
    }

    pub async fn contract(&self, contract_id: i64) -> Option<ContractBalance> {
        self.state.lock().await.contracts.get(&contract_id).copied()
    }

    pub async fn delivered_total(&self, contract_id: i64) -> i32 {
        self.state
            .lock()
            .await
            .deliveries
            .values()
            .filter(|d| d.contract_id == contract_id)
            .map(|d| d.eggs_delivered)
            .sum()
    }
}

pub struct InMemoryLedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Tx = InMemoryLedgerTx;

    async fn begin(&self) -> AppResult<InMemoryLedgerTx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryLedgerTx { guard, working })
    }

    async fn list_deliveries(&self) -> AppResult<Vec<Delivery>> {
        let state = self.state.lock().await;
        let mut deliveries: Vec<Delivery> = state.deliveries.values().cloned().collect();
        deliveries.sort_by(|a, b| b.delivered_at.cmp(&a.delivered_at).then(b.id.cmp(&a.id)));
        Ok(deliveries)
    }

    async fn get_delivery(&self, delivery_id: i64) -> AppResult<Option<Delivery>> {
        Ok(self.state.lock().await.deliveries.get(&delivery_id).cloned())
    }
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn load_contract(&mut self, contract_id: i64) -> AppResult<Option<ContractBalance>> {
        Ok(self.working.contracts.get(&contract_id).copied())
    }

    async fn lock_contract(&mut self, contract_id: i64) -> AppResult<Option<ContractBalance>> {
        self.load_contract(contract_id).await
    }

    async fn batch_contract_id(&mut self, batch_id: i64) -> AppResult<Option<i64>> {
        Ok(self.working.batches.get(&batch_id).copied())
    }

    async fn load_delivery(&mut self, delivery_id: i64) -> AppResult<Option<Delivery>> {
        Ok(self.working.deliveries.get(&delivery_id).cloned())
    }

    async fn insert_delivery(&mut self, delivery: &NewDelivery) -> AppResult<Delivery> {
        self.working.next_delivery_id += 1;
        let now = Utc::now();
        let stored = Delivery {
            id: self.working.next_delivery_id,
            contract_id: delivery.contract_id,
            batch_id: delivery.batch_id,
            delivered_at: delivery.delivered_at.unwrap_or(now),
            eggs_delivered: delivery.eggs_delivered,
            packaging: delivery.packaging.clone(),
            vegetables: delivery.vegetables.clone(),
            kitchen_gift: delivery.kitchen_gift.clone(),
            delivered_by: delivery.delivered_by.clone(),
            hen_delivered: delivery.hen_delivered,
            notes: delivery.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.working.deliveries.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_delivery(&mut self, delivery: &Delivery) -> AppResult<Delivery> {
        let mut updated = delivery.clone();
        updated.updated_at = Utc::now();
        match self.working.deliveries.get_mut(&delivery.id) {
            Some(slot) => {
                *slot = updated.clone();
                Ok(updated)
            }
            None => Err(AppError::NotFound("Delivery not found".to_string())),
        }
    }

    async fn delete_delivery(&mut self, delivery_id: i64) -> AppResult<()> {
        self.working.deliveries.remove(&delivery_id);
        Ok(())
    }

    async fn other_hen_delivery_exists(
        &mut self,
        contract_id: i64,
        excluding: i64,
    ) -> AppResult<bool> {
        Ok(self
            .working
            .deliveries
            .values()
            .any(|d| d.contract_id == contract_id && d.id != excluding && d.hen_delivered))
    }

    async fn apply_adjustment(
        &mut self,
        contract_id: i64,
        adjustment: LedgerAdjustment,
    ) -> AppResult<()> {
        let contract = self
            .working
            .contracts
            .get_mut(&contract_id)
            .ok_or(LedgerError::ContractNotFound(contract_id))?;

        let remaining = i64::from(contract.remaining_eggs) - i64::from(adjustment.debit);
        if remaining < 0 {
            return Err(LedgerError::InsufficientBalance {
                contract_id,
                remaining: i64::from(contract.remaining_eggs),
                requested: i64::from(adjustment.debit),
            }
            .into());
        }

        contract.remaining_eggs = remaining as i32;
        contract.hen_delivered = adjustment.hen_flag.apply(contract.hen_delivered);
        Ok(())
    }

    async fn commit(self) -> AppResult<()> {
        let InMemoryLedgerTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
