//! Delivery-driven contract balance reconciliation.
//!
//! Every delivery mutation moves a contract's `remaining_eggs` and may move its
//! `hen_delivered` flag. The functions here decide that movement against an
//! in-memory snapshot of the contract and return the [`LedgerAdjustment`] the
//! persistence layer must write in the same transaction as the delivery row.
//! They never touch storage, so a rejected operation leaves nothing behind.

use tracing::warn;

use crate::error::LedgerError;

/// The ledger-owned part of a contract row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractBalance {
    pub contract_id: i64,
    pub total_eggs: i32,
    pub remaining_eggs: i32,
    pub hen_delivered: bool,
}

/// What to do with the contract's hen flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HenFlagChange {
    Unchanged,
    /// Monotonic OR: a delivery carrying the hen was added or amended
    Set,
    /// Result of a live scan after the delivery that set the flag went away
    Recomputed(bool),
}

impl HenFlagChange {
    /// `(should_write, value)` pair for a guarded SQL update
    pub fn as_update(self) -> (bool, bool) {
        match self {
            HenFlagChange::Unchanged => (false, false),
            HenFlagChange::Set => (true, true),
            HenFlagChange::Recomputed(value) => (true, value),
        }
    }

    pub fn apply(self, current: bool) -> bool {
        match self {
            HenFlagChange::Unchanged => current,
            HenFlagChange::Set => true,
            HenFlagChange::Recomputed(value) => value,
        }
    }
}

/// Change to persist on the contract row.
///
/// `debit` is subtracted from `remaining_eggs`; a negative debit is a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerAdjustment {
    pub debit: i32,
    pub hen_flag: HenFlagChange,
}

impl LedgerAdjustment {
    pub fn is_noop(&self) -> bool {
        self.debit == 0 && self.hen_flag == HenFlagChange::Unchanged
    }
}

fn debit_balance(contract: &ContractBalance, debit: i64) -> Result<i32, LedgerError> {
    let remaining = i64::from(contract.remaining_eggs) - debit;
    if remaining < 0 {
        warn!(
            contract_id = contract.contract_id,
            remaining = contract.remaining_eggs,
            requested = debit,
            "Rejected delivery: insufficient remaining eggs"
        );
        return Err(LedgerError::InsufficientBalance {
            contract_id: contract.contract_id,
            remaining: i64::from(contract.remaining_eggs),
            requested: debit,
        });
    }
    i32::try_from(remaining).map_err(|_| LedgerError::InsufficientBalance {
        contract_id: contract.contract_id,
        remaining: i64::from(contract.remaining_eggs),
        requested: debit,
    })
}

fn ensure_positive(eggs_delivered: i32) -> Result<(), LedgerError> {
    if eggs_delivered <= 0 {
        return Err(LedgerError::InvalidQuantity(eggs_delivered));
    }
    Ok(())
}

/// Debit a new delivery against the contract.
///
/// This is the admission gate: a delivery that would overdraw the contract
/// is rejected before anything is mutated.
pub fn apply_creation(
    contract: &mut ContractBalance,
    eggs_delivered: i32,
    hen_delivered: bool,
) -> Result<LedgerAdjustment, LedgerError> {
    ensure_positive(eggs_delivered)?;
    let remaining = debit_balance(contract, i64::from(eggs_delivered))?;

    let hen_flag = if hen_delivered {
        HenFlagChange::Set
    } else {
        HenFlagChange::Unchanged
    };

    contract.remaining_eggs = remaining;
    contract.hen_delivered = hen_flag.apply(contract.hen_delivered);

    Ok(LedgerAdjustment {
        debit: eggs_delivered,
        hen_flag,
    })
}

/// Re-debit an amended delivery by the difference between its new and old quantity.
///
/// Clearing a delivery's hen flag here does not rescan the other deliveries;
/// only deletion recomputes the contract flag.
pub fn apply_amendment(
    contract: &mut ContractBalance,
    old_eggs_delivered: i32,
    new_eggs_delivered: Option<i32>,
    new_hen_delivered: Option<bool>,
) -> Result<LedgerAdjustment, LedgerError> {
    let (debit, remaining) = match new_eggs_delivered {
        Some(new_eggs) => {
            ensure_positive(new_eggs)?;
            let delta = i64::from(new_eggs) - i64::from(old_eggs_delivered);
            let remaining = debit_balance(contract, delta)?;
            let debit = i32::try_from(delta).map_err(|_| LedgerError::InvalidQuantity(new_eggs))?;
            (debit, remaining)
        }
        None => (0, contract.remaining_eggs),
    };

    let hen_flag = match new_hen_delivered {
        Some(true) => HenFlagChange::Set,
        _ => HenFlagChange::Unchanged,
    };

    contract.remaining_eggs = remaining;
    contract.hen_delivered = hen_flag.apply(contract.hen_delivered);

    Ok(LedgerAdjustment { debit, hen_flag })
}

/// Credit a removed delivery back to the contract.
///
/// The credit is unconditional. When the removed delivery carried the hen,
/// the flag is recomputed from `other_hen_delivered_exists`.
pub fn apply_deletion(
    contract: &mut ContractBalance,
    eggs_delivered: i32,
    hen_delivered: bool,
    other_hen_delivered_exists: bool,
) -> LedgerAdjustment {
    let hen_flag = if hen_delivered {
        HenFlagChange::Recomputed(other_hen_delivered_exists)
    } else {
        HenFlagChange::Unchanged
    };

    contract.remaining_eggs = contract.remaining_eggs.saturating_add(eggs_delivered);
    contract.hen_delivered = hen_flag.apply(contract.hen_delivered);

    LedgerAdjustment {
        debit: -eggs_delivered,
        hen_flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(total: i32, remaining: i32) -> ContractBalance {
        ContractBalance {
            contract_id: 1,
            total_eggs: total,
            remaining_eggs: remaining,
            hen_delivered: false,
        }
    }

    #[test]
    fn test_creation_debits_and_sets_hen() {
        let mut c = contract(200, 200);
        let adj = apply_creation(&mut c, 30, true).unwrap();

        assert_eq!(c.remaining_eggs, 170);
        assert!(c.hen_delivered);
        assert_eq!(adj.debit, 30);
        assert_eq!(adj.hen_flag, HenFlagChange::Set);
    }

    #[test]
    fn test_creation_without_hen_never_clears_flag() {
        let mut c = contract(200, 170);
        c.hen_delivered = true;
        let adj = apply_creation(&mut c, 10, false).unwrap();

        assert!(c.hen_delivered);
        assert_eq!(adj.hen_flag, HenFlagChange::Unchanged);
    }

    #[test]
    fn test_creation_overdraw_leaves_contract_untouched() {
        let mut c = contract(200, 170);
        let before = c;
        let err = apply_creation(&mut c, 300, true).unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                contract_id: 1,
                remaining: 170,
                requested: 300
            }
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_creation_may_drain_to_zero() {
        let mut c = contract(50, 50);
        apply_creation(&mut c, 50, false).unwrap();
        assert_eq!(c.remaining_eggs, 0);
    }

    #[test]
    fn test_creation_rejects_non_positive_quantity() {
        let mut c = contract(50, 50);
        assert_eq!(
            apply_creation(&mut c, 0, false),
            Err(LedgerError::InvalidQuantity(0))
        );
        assert_eq!(c.remaining_eggs, 50);
    }

    #[test]
    fn test_amendment_up_and_down() {
        let mut c = contract(200, 170);

        let adj = apply_amendment(&mut c, 30, Some(50), None).unwrap();
        assert_eq!(c.remaining_eggs, 150);
        assert_eq!(adj.debit, 20);

        let adj = apply_amendment(&mut c, 50, Some(10), None).unwrap();
        assert_eq!(c.remaining_eggs, 190);
        assert_eq!(adj.debit, -40);
    }

    #[test]
    fn test_amendment_overdraw_is_all_or_nothing() {
        let mut c = contract(100, 10);
        let before = c;
        let err = apply_amendment(&mut c, 90, Some(120), Some(true)).unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { requested: 30, .. }
        ));
        assert_eq!(c, before);
    }

    #[test]
    fn test_amendment_without_quantity_is_balance_neutral() {
        let mut c = contract(100, 40);
        let adj = apply_amendment(&mut c, 60, None, None).unwrap();

        assert_eq!(c.remaining_eggs, 40);
        assert!(adj.is_noop());
    }

    #[test]
    fn test_amendment_only_sets_hen_flag() {
        let mut c = contract(100, 40);

        apply_amendment(&mut c, 60, None, Some(true)).unwrap();
        assert!(c.hen_delivered);

        // Unsetting the flag on a delivery does not clear the contract flag
        let adj = apply_amendment(&mut c, 60, None, Some(false)).unwrap();
        assert!(c.hen_delivered);
        assert_eq!(adj.hen_flag, HenFlagChange::Unchanged);
    }

    #[test]
    fn test_deletion_credits_and_recomputes_hen() {
        let mut c = contract(200, 170);
        c.hen_delivered = true;

        let adj = apply_deletion(&mut c, 30, true, false);
        assert_eq!(c.remaining_eggs, 200);
        assert!(!c.hen_delivered);
        assert_eq!(adj.debit, -30);
        assert_eq!(adj.hen_flag, HenFlagChange::Recomputed(false));
    }

    #[test]
    fn test_deletion_keeps_hen_when_another_delivery_has_it() {
        let mut c = contract(200, 140);
        c.hen_delivered = true;

        apply_deletion(&mut c, 30, true, true);
        assert!(c.hen_delivered);
        assert_eq!(c.remaining_eggs, 170);
    }

    #[test]
    fn test_deletion_of_plain_delivery_leaves_flag_alone() {
        let mut c = contract(200, 140);
        c.hen_delivered = true;

        let adj = apply_deletion(&mut c, 30, false, false);
        assert!(c.hen_delivered);
        assert_eq!(adj.hen_flag, HenFlagChange::Unchanged);
    }

    #[test]
    fn test_hen_flag_update_pairs() {
        assert_eq!(HenFlagChange::Unchanged.as_update(), (false, false));
        assert_eq!(HenFlagChange::Set.as_update(), (true, true));
        assert_eq!(HenFlagChange::Recomputed(false).as_update(), (true, false));
    }

    #[test]
    fn test_balance_matches_sum_of_deliveries() {
        let total = 500;
        let mut c = contract(total, total);
        let mut deliveries: Vec<i32> = Vec::new();

        for eggs in [30, 45, 12, 200, 7] {
            apply_creation(&mut c, eggs, false).unwrap();
            deliveries.push(eggs);
        }
        // 200 -> 150
        apply_amendment(&mut c, deliveries[3], Some(150), None).unwrap();
        deliveries[3] = 150;
        // drop the 45
        let removed = deliveries.remove(1);
        apply_deletion(&mut c, removed, false, false);
        // overdraw attempt changes nothing
        assert!(apply_creation(&mut c, 10_000, false).is_err());

        let delivered: i32 = deliveries.iter().sum();
        assert_eq!(c.remaining_eggs, total - delivered);
        assert!(c.remaining_eggs >= 0);
    }
}
