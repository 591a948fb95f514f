use tracing::{info, warn};

use crate::{
    deliveries::models::{Delivery, DeliveryPatch, NewDelivery},
    error::{AppError, AppResult, LedgerError},
    ledger::{reconciler, LedgerStore, LedgerTx},
};

fn rejected(contract_id: i64, error: LedgerError) -> LedgerError {
    warn!(contract_id, %error, "Delivery rejected by contract ledger");
    error
}

/// Delivery resource operations. Every write runs the reconciler against the
/// parent contract and commits delivery and contract together.
pub struct DeliveryService<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> DeliveryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Delivery>> {
        self.store.list_deliveries().await
    }

    pub async fn get(&self, delivery_id: i64) -> AppResult<Delivery> {
        self.store
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))
    }

    pub async fn create(&self, request: NewDelivery) -> AppResult<Delivery> {
        let mut tx = self.store.begin().await?;

        let mut contract = tx
            .load_contract(request.contract_id)
            .await?
            .ok_or(LedgerError::ContractNotFound(request.contract_id))?;

        if let Some(batch_id) = request.batch_id {
            let owner = tx
                .batch_contract_id(batch_id)
                .await?
                .ok_or_else(|| AppError::InvalidReference("Batch not found".to_string()))?;
            if owner != contract.contract_id {
                return Err(LedgerError::BatchMismatch {
                    batch_id,
                    contract_id: contract.contract_id,
                }
                .into());
            }
        }

        let adjustment = reconciler::apply_creation(
            &mut contract,
            request.eggs_delivered,
            request.hen_delivered,
        )
        .map_err(|e| rejected(request.contract_id, e))?;

        let delivery = tx.insert_delivery(&request).await?;
        tx.apply_adjustment(contract.contract_id, adjustment).await?;
        tx.commit().await?;

        info!(
            delivery_id = delivery.id,
            contract_id = contract.contract_id,
            eggs = delivery.eggs_delivered,
            remaining = contract.remaining_eggs,
            "Delivery recorded"
        );
        Ok(delivery)
    }

    pub async fn amend(&self, delivery_id: i64, patch: DeliveryPatch) -> AppResult<Delivery> {
        let mut tx = self.store.begin().await?;

        let mut delivery = tx
            .load_delivery(delivery_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))?;
        let mut contract = tx
            .load_contract(delivery.contract_id)
            .await?
            .ok_or(LedgerError::ContractNotFound(delivery.contract_id))?;

        let adjustment = reconciler::apply_amendment(
            &mut contract,
            delivery.eggs_delivered,
            patch.eggs_delivered,
            patch.hen_delivered,
        )
        .map_err(|e| rejected(delivery.contract_id, e))?;

        patch.apply_to(&mut delivery);
        let updated = tx.update_delivery(&delivery).await?;
        tx.apply_adjustment(contract.contract_id, adjustment).await?;
        tx.commit().await?;

        info!(
            delivery_id,
            contract_id = contract.contract_id,
            debit = adjustment.debit,
            remaining = contract.remaining_eggs,
            "Delivery amended"
        );
        Ok(updated)
    }

    pub async fn remove(&self, delivery_id: i64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        let delivery = tx
            .load_delivery(delivery_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))?;
        // Removing a hen delivery recomputes the contract flag from a scan of
        // the other deliveries; the contract row stays locked from before the
        // scan until commit so a concurrent hen delivery cannot be overwritten
        let contract = if delivery.hen_delivered {
            tx.lock_contract(delivery.contract_id).await?
        } else {
            tx.load_contract(delivery.contract_id).await?
        };
        let mut contract = contract.ok_or(LedgerError::ContractNotFound(delivery.contract_id))?;

        let other_hen_delivered_exists = if delivery.hen_delivered {
            tx.other_hen_delivery_exists(contract.contract_id, delivery.id)
                .await?
        } else {
            false
        };

        let adjustment = reconciler::apply_deletion(
            &mut contract,
            delivery.eggs_delivered,
            delivery.hen_delivered,
            other_hen_delivered_exists,
        );

        tx.delete_delivery(delivery.id).await?;
        tx.apply_adjustment(contract.contract_id, adjustment).await?;
        tx.commit().await?;

        info!(
            delivery_id,
            contract_id = contract.contract_id,
            credited = delivery.eggs_delivered,
            remaining = contract.remaining_eggs,
            hen_delivered = contract.hen_delivered,
            "Delivery removed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::InMemoryLedgerStore;
    use std::sync::Arc;

    const CONTRACT: i64 = 1;

    fn delivery(eggs: i32, hen: bool) -> NewDelivery {
        NewDelivery {
            contract_id: CONTRACT,
            batch_id: None,
            delivered_at: None,
            eggs_delivered: eggs,
            packaging: "family box 30".to_string(),
            vegetables: None,
            kitchen_gift: None,
            delivered_by: Some("courier A".to_string()),
            hen_delivered: hen,
            notes: None,
        }
    }

    async fn service_with_contract(total: i32) -> (DeliveryService<InMemoryLedgerStore>, InMemoryLedgerStore) {
        let store = InMemoryLedgerStore::new();
        store.add_contract(CONTRACT, total, total).await;
        (DeliveryService::new(store.clone()), store)
    }

    async fn assert_ledger_consistent(store: &InMemoryLedgerStore) {
        let contract = store.contract(CONTRACT).await.unwrap();
        let delivered = store.delivered_total(CONTRACT).await;
        assert_eq!(contract.remaining_eggs, contract.total_eggs - delivered);
        assert!(contract.remaining_eggs >= 0);
    }

    #[tokio::test]
    async fn test_create_debits_contract_and_sets_hen() {
        let (service, store) = service_with_contract(200).await;

        let created = service.create(delivery(30, true)).await.unwrap();
        assert_eq!(created.eggs_delivered, 30);

        let contract = store.contract(CONTRACT).await.unwrap();
        assert_eq!(contract.remaining_eggs, 170);
        assert!(contract.hen_delivered);
        assert_ledger_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_overdraw_rejected_without_side_effects() {
        let (service, store) = service_with_contract(200).await;
        service.create(delivery(30, false)).await.unwrap();

        let err = service.create(delivery(300, true)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Ledger(LedgerError::InsufficientBalance {
                remaining: 170,
                requested: 300,
                ..
            })
        ));

        let contract = store.contract(CONTRACT).await.unwrap();
        assert_eq!(contract.remaining_eggs, 170);
        assert!(!contract.hen_delivered);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_amend_moves_balance_by_delta() {
        let (service, store) = service_with_contract(200).await;
        let created = service.create(delivery(30, false)).await.unwrap();

        let patch = DeliveryPatch {
            eggs_delivered: Some(50),
            ..Default::default()
        };
        service.amend(created.id, patch).await.unwrap();
        assert_eq!(store.contract(CONTRACT).await.unwrap().remaining_eggs, 150);

        let patch = DeliveryPatch {
            eggs_delivered: Some(10),
            ..Default::default()
        };
        let amended = service.amend(created.id, patch).await.unwrap();
        assert_eq!(amended.eggs_delivered, 10);
        assert_eq!(store.contract(CONTRACT).await.unwrap().remaining_eggs, 190);
        assert_ledger_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_amend_overdraw_discards_every_field() {
        let (service, store) = service_with_contract(100).await;
        let created = service.create(delivery(90, false)).await.unwrap();

        let patch = DeliveryPatch {
            eggs_delivered: Some(150),
            packaging: Some("crate".to_string()),
            hen_delivered: Some(true),
            ..Default::default()
        };
        assert!(service.amend(created.id, patch).await.is_err());

        let unchanged = service.get(created.id).await.unwrap();
        assert_eq!(unchanged.eggs_delivered, 90);
        assert_eq!(unchanged.packaging, "family box 30");
        assert!(!unchanged.hen_delivered);

        let contract = store.contract(CONTRACT).await.unwrap();
        assert_eq!(contract.remaining_eggs, 10);
        assert!(!contract.hen_delivered);
    }

    #[tokio::test]
    async fn test_amend_clearing_hen_keeps_contract_flag() {
        let (service, store) = service_with_contract(100).await;
        let created = service.create(delivery(10, true)).await.unwrap();

        let patch = DeliveryPatch {
            hen_delivered: Some(false),
            ..Default::default()
        };
        let amended = service.amend(created.id, patch).await.unwrap();

        assert!(!amended.hen_delivered);
        assert!(store.contract(CONTRACT).await.unwrap().hen_delivered);
    }

    #[tokio::test]
    async fn test_delete_only_hen_delivery_clears_flag() {
        let (service, store) = service_with_contract(200).await;
        let hen = service.create(delivery(30, true)).await.unwrap();
        service.create(delivery(20, false)).await.unwrap();

        service.remove(hen.id).await.unwrap();

        let contract = store.contract(CONTRACT).await.unwrap();
        assert!(!contract.hen_delivered);
        assert_eq!(contract.remaining_eggs, 180);
        assert_ledger_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_delete_one_of_two_hen_deliveries_keeps_flag() {
        let (service, store) = service_with_contract(200).await;
        let first = service.create(delivery(30, true)).await.unwrap();
        service.create(delivery(20, true)).await.unwrap();

        service.remove(first.id).await.unwrap();

        let contract = store.contract(CONTRACT).await.unwrap();
        assert!(contract.hen_delivered);
        assert_eq!(contract.remaining_eggs, 180);
    }

    #[tokio::test]
    async fn test_missing_references() {
        let (service, store) = service_with_contract(200).await;

        let mut orphan = delivery(10, false);
        orphan.contract_id = 99;
        assert!(matches!(
            service.create(orphan).await.unwrap_err(),
            AppError::Ledger(LedgerError::ContractNotFound(99))
        ));

        let mut unknown_batch = delivery(10, false);
        unknown_batch.batch_id = Some(5);
        assert!(matches!(
            service.create(unknown_batch).await.unwrap_err(),
            AppError::InvalidReference(_)
        ));

        store.add_contract(2, 50, 50).await;
        store.add_batch(6, 2).await;
        let mut foreign_batch = delivery(10, false);
        foreign_batch.batch_id = Some(6);
        assert!(matches!(
            service.create(foreign_batch).await.unwrap_err(),
            AppError::Ledger(LedgerError::BatchMismatch {
                batch_id: 6,
                contract_id: CONTRACT
            })
        ));

        store.add_batch(7, CONTRACT).await;
        let mut own_batch = delivery(10, false);
        own_batch.batch_id = Some(7);
        let created = service.create(own_batch).await.unwrap();
        assert_eq!(created.batch_id, Some(7));

        assert!(matches!(
            service.remove(404).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.amend(404, DeliveryPatch::default()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert_eq!(store.contract(CONTRACT).await.unwrap().remaining_eggs, 190);
    }

    #[tokio::test]
    async fn test_concurrent_deliveries_never_overdraw() {
        let (service, store) = service_with_contract(100).await;
        let service = Arc::new(service);

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.create(delivery(7, false)).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        // 100 / 7 = 14 deliveries fit
        assert_eq!(accepted, 14);
        assert_eq!(store.contract(CONTRACT).await.unwrap().remaining_eggs, 2);
        assert_ledger_consistent(&store).await;
    }

    #[tokio::test]
    async fn test_mixed_sequence_keeps_invariant() {
        let (service, store) = service_with_contract(300).await;

        let a = service.create(delivery(40, false)).await.unwrap();
        let b = service.create(delivery(60, true)).await.unwrap();
        let c = service.create(delivery(25, false)).await.unwrap();
        assert_ledger_consistent(&store).await;

        service
            .amend(
                a.id,
                DeliveryPatch {
                    eggs_delivered: Some(80),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_ledger_consistent(&store).await;

        service.remove(b.id).await.unwrap();
        assert!(!store.contract(CONTRACT).await.unwrap().hen_delivered);
        assert_ledger_consistent(&store).await;

        assert!(service.create(delivery(1_000, false)).await.is_err());
        service.remove(c.id).await.unwrap();
        assert_ledger_consistent(&store).await;
        assert_eq!(store.contract(CONTRACT).await.unwrap().remaining_eggs, 220);
    }
}
