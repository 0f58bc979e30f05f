//! Export Module
//!
//! - `E` key or `:export` writes the whole table (all pages) to CSV
//! - Files saved to `<data dir>/exports/`

mod csv_export;

use std::fs;
use std::path::Path;

use chrono::Local;

use crate::core::{Action, NotifyLevel};
use crate::domain::Row;

/// Generate a timestamped filename
fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

/// Export every row to a fresh CSV file under `export_dir`
pub fn export_rows(rows: &[Row], export_dir: &Path) -> Action {
    if rows.iter().all(|row| !row.has_address()) {
        return Action::Notify("No addresses to export".to_string(), NotifyLevel::Warn);
    }

    if let Err(e) = fs::create_dir_all(export_dir) {
        return Action::Notify(
            format!("Failed to create export directory: {}", e),
            NotifyLevel::Error,
        );
    }

    let filename = generate_filename("rows", "csv");
    let path = export_dir.join(&filename);

    match csv_export::write_rows(&path, rows) {
        Ok(count) => {
            log::info!("exported {} rows to {}", count, path.display());
            Action::Notify(
                format!("Exported {} rows to {}", count, path.display()),
                NotifyLevel::Info,
            )
        }
        Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
    }
}
