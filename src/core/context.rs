//! Session state owned by the app
//!
//! Holds the row table, the page window, the title and the storage they
//! persist to. Created once by `load` and flushed once by `teardown`.

use std::time::Instant;

use anyhow::{Context as _, Result};

use crate::domain::{pagination, NewRow, PageView, Pagination, RowId, RowStore, SnapshotEntry};
use crate::store::{KeyValueStore, KEY_CURRENT_PAGE, KEY_PAGE_SIZE, KEY_ROWS, KEY_TITLE};

/// Values used when storage has nothing for a key
#[derive(Debug, Clone)]
pub struct Defaults {
    pub title: String,
    pub page_size: usize,
}

/// Page navigation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    First,
    Prev,
    Next,
    Last,
    To(usize),
}

pub struct Context {
    rows: RowStore,
    pagination: Pagination,
    title: String,
    defaults: Defaults,
    storage: Box<dyn KeyValueStore>,
}

impl Context {
    /// Hydrate from storage. Missing or unreadable entries fall back to
    /// defaults; an empty table is seeded with one blank row.
    pub fn load(storage: Box<dyn KeyValueStore>, defaults: Defaults) -> Self {
        let mut rows = RowStore::new();
        let snapshot = read_snapshot(storage.as_ref());
        if snapshot.is_empty() {
            rows.add_row(NewRow::default());
            rows.mark_persisted();
        } else {
            rows.restore(snapshot);
        }

        let title = read_key(storage.as_ref(), KEY_TITLE)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| defaults.title.clone());
        let page_size = read_key(storage.as_ref(), KEY_PAGE_SIZE)
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.page_size);
        let current_page = read_key(storage.as_ref(), KEY_CURRENT_PAGE)
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(1);

        let mut pagination = Pagination::new(current_page, page_size);
        pagination.clamp(rows.len());
        log::info!(
            "loaded {} rows, page {}/{} (size {})",
            rows.len(),
            pagination.current_page,
            pagination::total_pages(rows.len(), page_size),
            page_size
        );

        Self {
            rows,
            pagination,
            title,
            defaults,
            storage,
        }
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut RowStore {
        &mut self.rows
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn view(&self) -> PageView {
        self.pagination.view(self.rows.len())
    }

    // === Persisted preferences ===

    /// Blank input restores the default title
    pub fn set_title(&mut self, text: &str) -> Result<&str> {
        let text = text.trim();
        self.title = if text.is_empty() {
            self.defaults.title.clone()
        } else {
            text.to_string()
        };
        self.storage.set(KEY_TITLE, &self.title)?;
        Ok(&self.title)
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        self.pagination.set_page_size(page_size);
        self.storage
            .set(KEY_PAGE_SIZE, &self.pagination.page_size.to_string())?;
        self.save_page()
    }

    pub fn cycle_page_size(&mut self) -> Result<usize> {
        let next = self.pagination.next_page_size();
        self.set_page_size(next)?;
        Ok(next)
    }

    pub fn navigate(&mut self, nav: PageNav) -> Result<bool> {
        let total = self.rows.len();
        let changed = match nav {
            PageNav::First => self.pagination.first(),
            PageNav::Prev => self.pagination.prev(),
            PageNav::Next => self.pagination.next(total),
            PageNav::Last => self.pagination.last(total),
            PageNav::To(page) => {
                let pages = pagination::total_pages(total, self.pagination.page_size);
                self.pagination.go_to(page.clamp(1, pages))
            }
        };
        if changed {
            self.save_page()?;
        }
        Ok(changed)
    }

    /// Move to the page holding `id`
    pub fn show_row(&mut self, id: RowId) -> Result<()> {
        if let Some(index) = self.rows.position(id) {
            if self.pagination.show_index(index) {
                self.save_page()?;
            }
        }
        Ok(())
    }

    /// Pull the page back in range after rows were removed
    pub fn clamp_page(&mut self) -> Result<()> {
        if self.pagination.clamp(self.rows.len()) {
            self.save_page()?;
        }
        Ok(())
    }

    fn save_page(&mut self) -> Result<()> {
        self.storage
            .set(KEY_CURRENT_PAGE, &self.pagination.current_page.to_string())
    }

    // === Row snapshot ===

    /// Write the snapshot if the debounce window has elapsed
    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool> {
        if !self.rows.take_persist_due(now) {
            return Ok(false);
        }
        self.save_rows()?;
        Ok(true)
    }

    pub fn save_rows(&mut self) -> Result<()> {
        let snapshot = self.rows.serialize();
        let json = serde_json::to_string(&snapshot).context("serialize rows")?;
        self.storage.set(KEY_ROWS, &json)?;
        self.rows.mark_persisted();
        log::debug!("saved {} rows", snapshot.len());
        Ok(())
    }

    /// Flush whatever is still pending; called on exit
    pub fn teardown(&mut self) -> Result<()> {
        if self.rows.persist_pending() {
            self.save_rows()?;
        }
        Ok(())
    }
}

fn read_key(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("failed to read {}: {:#}", key, err);
            None
        }
    }
}

fn read_snapshot(storage: &dyn KeyValueStore) -> Vec<SnapshotEntry> {
    let Some(json) = read_key(storage, KEY_ROWS) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<SnapshotEntry>>(&json) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("discarding unreadable row snapshot: {}", err);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;

    const A: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    fn defaults() -> Defaults {
        Defaults {
            title: "Address Tracker".to_string(),
            page_size: 10,
        }
    }

    #[test]
    fn test_empty_storage_seeds_one_row() {
        let ctx = Context::load(Box::new(MemoryStore::new()), defaults());
        assert_eq!(ctx.rows().len(), 1);
        assert!(!ctx.rows().rows()[0].has_address());
        assert!(!ctx.rows().persist_pending());
        assert_eq!(ctx.title(), "Address Tracker");
        assert_eq!(ctx.pagination(), Pagination::new(1, 10));
    }

    #[test]
    fn test_stored_page_is_clamped() {
        let store = MemoryStore::new();
        store.set(KEY_CURRENT_PAGE, "9").unwrap();
        store.set(KEY_PAGE_SIZE, "20").unwrap();
        let ctx = Context::load(Box::new(store), defaults());
        assert_eq!(ctx.pagination(), Pagination::new(1, 20));
    }

    #[test]
    fn test_garbage_snapshot_falls_back() {
        let store = MemoryStore::new();
        store.set(KEY_ROWS, "{not json").unwrap();
        let ctx = Context::load(Box::new(store), defaults());
        assert_eq!(ctx.rows().len(), 1);
    }

    #[test]
    fn test_blank_title_restores_default() {
        let mut ctx = Context::load(Box::new(MemoryStore::new()), defaults());
        assert_eq!(ctx.set_title("  Treasury ").unwrap(), "Treasury");
        assert_eq!(ctx.set_title("   ").unwrap(), "Address Tracker");
    }

    #[test]
    fn test_flush_waits_for_window() {
        let mut ctx = Context::load(Box::new(MemoryStore::new()), defaults());
        ctx.rows_mut().add_row(NewRow::with_address(A));
        assert!(!ctx.flush_if_due(Instant::now()).unwrap());
        let later = Instant::now() + Duration::from_millis(600);
        assert!(ctx.flush_if_due(later).unwrap());
        assert!(!ctx.flush_if_due(later).unwrap());
    }

    #[test]
    fn test_navigate_to_clamps() {
        let mut ctx = Context::load(Box::new(MemoryStore::new()), defaults());
        for _ in 0..24 {
            ctx.rows_mut().add_row(NewRow::default());
        }
        assert!(ctx.navigate(PageNav::To(99)).unwrap());
        assert_eq!(ctx.pagination().current_page, 3);
        assert!(!ctx.navigate(PageNav::Next).unwrap());
        assert!(ctx.navigate(PageNav::First).unwrap());
    }
}
