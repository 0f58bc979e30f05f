//! Rows, title and page state survive a restart through the SQLite store

use std::time::{Duration, Instant};

use tally::core::{Context, Defaults, PageNav};
use tally::domain::{Figure, NewRow, RowStore};
use tally::store::{KeyValueStore, SqliteStore, KEY_ROWS};

const A: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
const B: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

fn defaults() -> Defaults {
    Defaults {
        title: "Address Tracker".to_string(),
        page_size: 10,
    }
}

#[test]
fn test_snapshot_round_trip_keeps_order_and_figures() {
    let mut store = RowStore::new();
    store.add_row(NewRow {
        address: Some(A.to_lowercase()),
        label: "vitalik".to_string(),
        balance: Figure::Value("1.2345".to_string()),
        tx_count: Figure::Value("42".to_string()),
    });
    store.add_row(NewRow::default());
    store.add_row(NewRow {
        balance: Figure::Failed,
        tx_count: Figure::Failed,
        ..NewRow::with_address(B)
    });

    // Rows without an address are not persisted
    let snapshot = store.serialize();
    assert_eq!(snapshot.len(), 2);

    let mut restored = RowStore::new();
    restored.restore(snapshot);
    let rows = restored.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].address.as_deref(), Some(A));
    assert_eq!(rows[0].label, "vitali");
    assert_eq!(rows[0].balance_display(), "1.2345");
    assert_eq!(rows[0].tx_count_display(), "42");
    assert_eq!(rows[1].address.as_deref(), Some(B));
    assert_eq!(rows[1].balance, Figure::Failed);
    assert!(restored.registry().contains(B));
    assert!(!restored.persist_pending());
}

#[test]
fn test_context_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("tally.sqlite3");

    {
        let storage = SqliteStore::open(&db).unwrap();
        let mut ctx = Context::load(Box::new(storage), defaults());
        for n in 0..25 {
            ctx.rows_mut()
                .add_row(NewRow::with_address(format!("0x{:040x}", n + 1)));
        }
        ctx.set_page_size(20).unwrap();
        ctx.navigate(PageNav::Last).unwrap();
        ctx.set_title("Cold wallets").unwrap();
        ctx.teardown().unwrap();
    }

    let storage = SqliteStore::open(&db).unwrap();
    let ctx = Context::load(Box::new(storage), defaults());
    // The blank seed row was never persisted
    assert_eq!(ctx.rows().len(), 25);
    assert_eq!(ctx.title(), "Cold wallets");
    assert_eq!(ctx.pagination().page_size, 20);
    assert_eq!(ctx.pagination().current_page, 2);
    assert_eq!(ctx.view().range, 20..25);
}

#[test]
fn test_writes_wait_for_debounce_window() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("tally.sqlite3");
    let storage = SqliteStore::open(&db).unwrap();
    let mut ctx = Context::load(Box::new(storage), defaults());

    ctx.rows_mut().add_row(NewRow::with_address(A));
    ctx.rows_mut().add_row(NewRow::with_address(B));
    assert!(!ctx.flush_if_due(Instant::now()).unwrap());

    let later = Instant::now() + Duration::from_secs(1);
    assert!(ctx.flush_if_due(later).unwrap());
    assert!(!ctx.flush_if_due(later).unwrap());

    let reader = SqliteStore::open(&db).unwrap();
    let json = reader.get(KEY_ROWS).unwrap().unwrap();
    assert!(json.contains("\"address\""));
    assert!(json.contains(B));
}
