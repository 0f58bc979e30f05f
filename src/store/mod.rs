//! Local persistence

mod debounce;
mod kv;

pub use debounce::{Debouncer, PERSIST_WINDOW};
pub use kv::{
    KeyValueStore, MemoryStore, SqliteStore, KEY_CURRENT_PAGE, KEY_PAGE_SIZE, KEY_ROWS, KEY_TITLE,
};
