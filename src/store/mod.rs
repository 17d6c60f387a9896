//! In-memory deal store
//!
//! The single owner of deal records. Every other component reads snapshots
//! from here or mutates through one of the closures below.

mod deals;
pub mod models;
mod seed;

use crate::error::Result;
use deals::DealTable;
use models::{Deal, DealFilter};
use parking_lot::RwLock;

pub use seed::sample_deals;

/// Deal store wrapper
#[derive(Debug, Default)]
pub struct DealStore {
    table: RwLock<DealTable>,
}

impl DealStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Reads ==========

    /// Get a deal by id
    pub fn get(&self, id: &str) -> Option<Deal> {
        let table = self.table.read();
        deals::get(&table, id).cloned()
    }

    /// All deals in board order
    pub fn list(&self) -> Vec<Deal> {
        let table = self.table.read();
        deals::list(&table)
    }

    /// Deals matching a board filter, in board order
    pub fn filter(&self, filter: &DealFilter) -> Vec<Deal> {
        let table = self.table.read();
        deals::list(&table)
            .into_iter()
            .filter(|deal| filter.matches(deal))
            .collect()
    }

    pub fn len(&self) -> usize {
        let table = self.table.read();
        deals::count(&table)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========== Writes ==========

    /// Add a deal
    ///
    /// Fails with `DuplicateId` on a colliding id and `Validation` when the
    /// stage history is empty or stale, or the potential profit is negative.
    pub fn insert(&self, deal: Deal) -> Result<()> {
        let mut table = self.table.write();
        deals::insert(&mut table, deal)
    }

    /// Insert a copy derived from an existing deal under one write lock
    ///
    /// Returns `None` when `id` is not stored.
    pub(crate) fn insert_derived(
        &self,
        id: &str,
        derive: impl FnOnce(&Deal) -> Deal,
    ) -> Option<Result<Deal>> {
        let mut table = self.table.write();
        let copy = derive(deals::get(&table, id)?);
        Some(deals::insert(&mut table, copy.clone()).map(|()| copy))
    }

    /// Mutate a deal in place under the write lock
    pub(crate) fn modify<R>(&self, id: &str, f: impl FnOnce(&mut Deal) -> R) -> Option<R> {
        let mut table = self.table.write();
        deals::get_mut(&mut table, id).map(f)
    }

    /// Remove a deal
    pub fn remove(&self, id: &str) -> Option<Deal> {
        let mut table = self.table.write();
        deals::remove(&mut table, id)
    }

    /// Bulk load; a colliding or malformed record rejects the whole batch
    pub fn load(&self, batch: Vec<Deal>) -> Result<usize> {
        let mut table = self.table.write();
        deals::insert_all(&mut table, batch)
    }

    /// Drop every deal
    pub fn clear(&self) {
        let mut table = self.table.write();
        deals::clear(&mut table);
    }
}
