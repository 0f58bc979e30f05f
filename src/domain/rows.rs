//! Ordered row collection with its address registry
//!
//! Every mutation schedules a debounced snapshot write; the owner polls
//! `take_persist_due` and writes `serialize()` when it fires.

use std::collections::HashSet;
use std::time::Instant;

use crate::store::Debouncer;

use super::error::RejectReason;
use super::registry::AddressRegistry;
use super::row::{clamp_label, Figure, NewRow, QueryTarget, Row, RowId, SnapshotEntry};
use super::validator::{self, Validation};

/// Result of appending a row. The row exists even when its initial
/// address was refused; it then shows the refused input highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Added {
    pub id: RowId,
    pub rejected: Option<RejectReason>,
}

#[derive(Debug, Default)]
pub struct RowStore {
    rows: Vec<Row>,
    registry: AddressRegistry,
    next_id: u64,
    persist: Debouncer,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    fn get_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    fn touch(&mut self) {
        self.persist.schedule(Instant::now());
    }

    // === Mutations ===

    pub fn add_row(&mut self, initial: NewRow) -> Added {
        let added = self.push(initial);
        self.touch();
        added
    }

    fn push(&mut self, initial: NewRow) -> Added {
        self.next_id += 1;
        let id = RowId(self.next_id);
        let mut row = Row::new(id);
        row.label = clamp_label(&initial.label);
        row.balance = initial.balance;
        row.tx_count = initial.tx_count;

        let mut rejected = None;
        if let Some(raw) = initial.address.as_deref() {
            match validator::validate(raw, None, &mut self.registry) {
                Ok(Validation::Accepted(address)) => row.address = Some(address),
                Ok(Validation::NotSet) => {}
                Err(reason) => {
                    rejected = Some(reason);
                    row.rejected_input = Some(raw.trim().to_string());
                    row.balance = Figure::Unfetched;
                    row.tx_count = Figure::Unfetched;
                }
            }
        }

        self.rows.push(row);
        Added { id, rejected }
    }

    pub fn remove_row(&mut self, id: RowId) -> Option<Row> {
        let index = self.position(id)?;
        let row = self.rows.remove(index);
        if let Some(address) = row.address.as_deref() {
            self.registry.remove(address);
        }
        self.touch();
        Some(row)
    }

    /// Batch delete: one scheduled write regardless of how many rows go
    pub fn remove_rows(&mut self, ids: &HashSet<RowId>) -> usize {
        let before = self.rows.len();
        let registry = &mut self.registry;
        self.rows.retain(|row| {
            if !ids.contains(&row.id) {
                return true;
            }
            if let Some(address) = row.address.as_deref() {
                registry.remove(address);
            }
            false
        });
        let removed = before - self.rows.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn set_label(&mut self, id: RowId, label: &str) -> bool {
        let Some(row) = self.get_mut(id) else {
            return false;
        };
        row.label = clamp_label(label);
        self.touch();
        true
    }

    /// Re-validate a field against its committed address. A refusal keeps
    /// the committed address and records the refused input; empty input
    /// clears the field.
    pub fn edit_address(&mut self, id: RowId, raw: &str) -> Result<Validation, RejectReason> {
        let Some(index) = self.position(id) else {
            return Ok(Validation::NotSet);
        };
        let previous = self.rows[index].address.clone();
        let result = validator::validate(raw, previous.as_deref(), &mut self.registry);
        let row = &mut self.rows[index];

        match &result {
            Ok(Validation::Accepted(address)) => {
                if previous.as_deref() != Some(address.as_str()) {
                    row.balance = Figure::Unfetched;
                    row.tx_count = Figure::Unfetched;
                }
                row.address = Some(address.clone());
                row.rejected_input = None;
            }
            Ok(Validation::NotSet) => {
                if let Some(prev) = previous.as_deref() {
                    self.registry.remove(prev);
                }
                row.address = None;
                row.rejected_input = None;
                row.balance = Figure::Unfetched;
                row.tx_count = Figure::Unfetched;
            }
            Err(_) => {
                row.rejected_input = Some(raw.trim().to_string());
            }
        }

        self.touch();
        result
    }

    pub fn mark_loading(&mut self, id: RowId, loading: bool) {
        if let Some(row) = self.get_mut(id) {
            row.loading = loading;
        }
    }

    /// Store fetched figures. Results for rows deleted mid-flight are dropped.
    pub fn update_balance(&mut self, id: RowId, balance: Figure, tx_count: Figure) -> bool {
        let Some(row) = self.get_mut(id) else {
            return false;
        };
        row.balance = balance;
        row.tx_count = tx_count;
        row.loading = false;
        self.touch();
        true
    }

    // === Selection (batch delete mode) ===

    pub fn toggle_selected(&mut self, id: RowId) {
        if let Some(row) = self.get_mut(id) {
            row.selected = !row.selected;
        }
    }

    pub fn select_all(&mut self, selected: bool) {
        for row in &mut self.rows {
            row.selected = selected;
        }
    }

    pub fn selected_ids(&self) -> HashSet<RowId> {
        self.rows
            .iter()
            .filter(|row| row.selected)
            .map(|row| row.id)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|row| row.selected).count()
    }

    // === Queries ===

    /// Rows with a committed address, in table order
    pub fn query_targets(&self) -> Vec<QueryTarget> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.address.as_ref().map(|address| QueryTarget {
                    id: row.id,
                    address: address.clone(),
                })
            })
            .collect()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.rows.iter().filter_map(|row| row.address.clone()).collect()
    }

    // === Snapshot ===

    /// Durable form; rows without a committed address are left out
    pub fn serialize(&self) -> Vec<SnapshotEntry> {
        self.rows
            .iter()
            .filter_map(|row| {
                let address = row.address.clone()?;
                Some(SnapshotEntry {
                    address,
                    description: row.label.clone(),
                    balance: row.balance.as_str().to_string(),
                    tx_count: row.tx_count.as_str().to_string(),
                })
            })
            .collect()
    }

    /// Replace everything with the snapshot's rows, in order
    pub fn restore(&mut self, snapshot: Vec<SnapshotEntry>) {
        self.rows.clear();
        self.registry.clear();
        for entry in snapshot {
            let address = entry.address.clone();
            if let Some(reason) = self.push(entry.into()).rejected {
                log::warn!("snapshot entry {} not tracked: {}", address, reason);
            }
        }
        self.persist.cancel();
    }

    // === Persistence schedule ===

    pub fn persist_pending(&self) -> bool {
        self.persist.is_pending()
    }

    pub fn take_persist_due(&mut self, now: Instant) -> bool {
        self.persist.take_due(now)
    }

    pub fn mark_persisted(&mut self) {
        self.persist.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const A: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    const B: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

    #[test]
    fn test_add_registers_valid_address() {
        let mut store = RowStore::new();
        let added = store.add_row(NewRow::with_address(A).labeled("main wallet"));
        assert_eq!(added.rejected, None);
        assert!(store.registry().contains(A));
        let row = store.get(added.id).unwrap();
        assert_eq!(row.label, "main w");
        assert_eq!(row.address.as_deref(), Some(A));
    }

    #[test]
    fn test_add_duplicate_keeps_row_but_not_registration() {
        let mut store = RowStore::new();
        store.add_row(NewRow::with_address(A));
        let dup = store.add_row(NewRow::with_address(A.to_lowercase()));
        assert_eq!(dup.rejected, Some(RejectReason::Duplicate));
        assert_eq!(store.len(), 2);
        assert_eq!(store.registry().len(), 1);
        assert!(store.get(dup.id).unwrap().address.is_none());
    }

    #[test]
    fn test_remove_unregisters() {
        let mut store = RowStore::new();
        let id = store.add_row(NewRow::with_address(A)).id;
        store.remove_row(id);
        assert!(store.is_empty());
        assert!(!store.registry().contains(A));
        assert!(store.add_row(NewRow::with_address(A)).rejected.is_none());
    }

    #[test]
    fn test_remove_rows_batch() {
        let mut store = RowStore::new();
        let a = store.add_row(NewRow::with_address(A)).id;
        let b = store.add_row(NewRow::with_address(B)).id;
        let empty = store.add_row(NewRow::default()).id;
        let ids: HashSet<RowId> = [a, empty].into_iter().collect();
        assert_eq!(store.remove_rows(&ids), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.rows()[0].id, b);
        assert!(!store.registry().contains(A));
        assert!(store.registry().contains(B));
    }

    #[test]
    fn test_edit_address_rejection_keeps_committed() {
        let mut store = RowStore::new();
        store.add_row(NewRow::with_address(A));
        let id = store.add_row(NewRow::with_address(B)).id;

        assert_eq!(store.edit_address(id, A), Err(RejectReason::Duplicate));
        let row = store.get(id).unwrap();
        assert_eq!(row.address.as_deref().map(str::to_lowercase), Some(B.to_string()));
        assert_eq!(row.rejected_input.as_deref(), Some(A));
        assert!(store.registry().contains(B));

        assert!(store.edit_address(id, B).is_ok());
        assert!(store.get(id).unwrap().rejected_input.is_none());
    }

    #[test]
    fn test_edit_address_clear_unregisters() {
        let mut store = RowStore::new();
        let id = store.add_row(NewRow::with_address(A)).id;
        assert_eq!(store.edit_address(id, "  "), Ok(Validation::NotSet));
        assert!(store.get(id).unwrap().address.is_none());
        assert!(store.registry().is_empty());
    }

    #[test]
    fn test_update_balance_clears_loading() {
        let mut store = RowStore::new();
        let id = store.add_row(NewRow::with_address(A)).id;
        store.mark_loading(id, true);
        let updated =
            store.update_balance(id, Figure::Value("1.5000".into()), Figure::Value("3".into()));
        assert!(updated);
        let row = store.get(id).unwrap();
        assert!(!row.loading);
        assert_eq!(row.balance_display(), "1.5000");
        assert!(!store.update_balance(RowId(999), Figure::Failed, Figure::Failed));
    }

    #[test]
    fn test_serialize_skips_rows_without_address() {
        let mut store = RowStore::new();
        store.add_row(NewRow::default());
        store.add_row(NewRow::with_address(A).labeled("cold"));
        store.add_row(NewRow::with_address("garbage"));
        let snapshot = store.serialize();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].address, A);
        assert_eq!(snapshot[0].description, "cold");
        assert_eq!(snapshot[0].balance, "-");
    }

    #[test]
    fn test_mutations_schedule_one_write() {
        let mut store = RowStore::new();
        for _ in 0..50 {
            store.add_row(NewRow::default());
        }
        assert!(store.persist_pending());
        let later = Instant::now() + Duration::from_millis(600);
        assert!(store.take_persist_due(later));
        assert!(!store.take_persist_due(later));
    }

    #[test]
    fn test_restore_does_not_schedule_write() {
        let mut store = RowStore::new();
        store.restore(vec![SnapshotEntry {
            address: A.into(),
            description: "x".into(),
            balance: "1.0000".into(),
            tx_count: "2".into(),
        }]);
        assert!(!store.persist_pending());
        assert_eq!(store.rows()[0].balance, Figure::Value("1.0000".into()));
    }
}
