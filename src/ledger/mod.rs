// Contract ledger: reconciliation rules and the storage seam they run against
pub mod postgres;
pub mod reconciler;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use postgres::PgLedgerStore;
pub use store::{LedgerStore, LedgerTx};
