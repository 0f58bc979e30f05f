//! Domain layer - the tracked table and the rules governing it
//!
//! Everything here is synchronous and free of I/O apart from the import
//! readers; network lookups live in the infrastructure layer.

mod address;
mod error;
pub mod import;
pub mod pagination;
mod registry;
mod row;
mod rows;
pub mod stats;
pub mod validator;

pub use address::{canonical, fold, is_address, parse_address, short_display};
pub use error::{RejectReason, TrackerError};
pub use import::{ImportItem, ImportSource, ImportSummary};
pub use pagination::{PageView, Pagination, DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES};
pub use registry::AddressRegistry;
pub use row::{
    clamp_label, Figure, NewRow, QueryTarget, Row, RowId, SnapshotEntry, LABEL_MAX_CHARS,
};
pub use rows::{Added, RowStore};
pub use stats::{FiatPrice, Stats};
pub use validator::Validation;
