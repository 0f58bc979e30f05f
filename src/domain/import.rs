//! Turning pasted text and files into tracked rows
//!
//! Readers only produce candidates; `apply` is the single place that
//! decides, one candidate at a time and in order, what gets tracked.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};

use super::error::{RejectReason, TrackerError};
use super::row::{clamp_label, NewRow};
use super::rows::RowStore;
use super::validator::{self, Validation};

/// One candidate address with its optional description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub address: String,
    pub description: String,
}

impl ImportItem {
    pub fn bare(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    Spreadsheet,
    Csv,
    PlainText,
}

impl ImportSource {
    pub fn from_path(path: &Path) -> Result<Self, TrackerError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(ImportSource::Spreadsheet),
            "csv" => Ok(ImportSource::Csv),
            "txt" => Ok(ImportSource::PlainText),
            _ => Err(TrackerError::UnsupportedFileType(path.display().to_string())),
        }
    }
}

/// Counts for the summary toast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub invalid: usize,
    pub duplicate: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.imported + self.invalid + self.duplicate
    }

    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if self.imported > 0 {
            parts.push(format!("Imported {}", self.imported));
        }
        if self.invalid > 0 {
            parts.push(format!("{} invalid", self.invalid));
        }
        if self.duplicate > 0 {
            parts.push(format!("{} duplicate", self.duplicate));
        }
        if parts.is_empty() {
            "Nothing imported".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Split pasted text on whitespace, commas (ASCII and full-width) and newlines
pub fn parse_text(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == '，')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Plain-file convention: one candidate per line or comma-separated cell
pub fn parse_plain_file(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a file into candidates according to its extension
pub fn read_file(path: &Path) -> Result<Vec<ImportItem>, TrackerError> {
    let source = ImportSource::from_path(path)?;
    let items = match source {
        ImportSource::Spreadsheet => read_spreadsheet(path)?,
        ImportSource::Csv => read_csv(path)?,
        ImportSource::PlainText => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| TrackerError::parse_failure(path, err))?;
            parse_plain_file(&text)
                .into_iter()
                .map(ImportItem::bare)
                .collect()
        }
    };
    log::info!("read {} candidates from {}", items.len(), path.display());
    Ok(items)
}

/// First sheet, column 0 = address, column 1 = description. Columns are
/// absolute, so a sheet whose used range starts further right yields nothing.
pub fn read_spreadsheet(path: &Path) -> Result<Vec<ImportItem>, TrackerError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| TrackerError::parse_failure(path, err))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|err| TrackerError::parse_failure(path, err))?,
        None => return Err(TrackerError::parse_failure(path, "workbook has no sheets")),
    };

    let (Some((first_row, _)), Some((last_row, _))) = (range.start(), range.end()) else {
        return Ok(Vec::new());
    };

    let cell_text = |row: u32, col: u32| -> String {
        match range.get_value((row, col)) {
            None | Some(Data::Empty) => String::new(),
            Some(value) => value.to_string().trim().to_string(),
        }
    };

    let items = (first_row..=last_row)
        .filter_map(|row| {
            let address = cell_text(row, 0);
            if address.is_empty() {
                return None;
            }
            Some(ImportItem {
                address,
                description: cell_text(row, 1),
            })
        })
        .collect();
    Ok(items)
}

/// Same column convention as spreadsheets; no header row is assumed
pub fn read_csv(path: &Path) -> Result<Vec<ImportItem>, TrackerError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| TrackerError::parse_failure(path, err))?;

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| TrackerError::parse_failure(path, err))?;
        let address = record.get(0).unwrap_or_default();
        if address.is_empty() {
            continue;
        }
        items.push(ImportItem {
            address: address.to_string(),
            description: record.get(1).unwrap_or_default().to_string(),
        });
    }
    Ok(items)
}

/// Feed candidates through the validator into the store, in order. A
/// candidate duplicating one accepted earlier in the same call counts as
/// a duplicate.
pub fn apply(store: &mut RowStore, items: Vec<ImportItem>) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for item in items {
        match validator::check(&item.address, None, store.registry()) {
            Ok(Validation::Accepted(address)) => {
                let label = clamp_label(&item.description);
                store.add_row(NewRow::with_address(address).labeled(&label));
                summary.imported += 1;
            }
            Ok(Validation::NotSet) => {}
            Err(RejectReason::InvalidFormat) => summary.invalid += 1,
            Err(RejectReason::Duplicate) => summary.duplicate += 1,
        }
    }
    log::info!(
        "import: {} imported, {} invalid, {} duplicate",
        summary.imported,
        summary.invalid,
        summary.duplicate
    );
    summary
}

/// Resolve `~/` against the home directory for paths typed at the prompt
pub fn expand_path(input: &str) -> PathBuf {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    const B: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

    #[test]
    fn test_parse_text_separators() {
        let raw = format!(" {A},{B}\n\n  {A}，x \t y ");
        assert_eq!(parse_text(&raw), vec![A, B, A, "x", "y"]);
        assert!(parse_text("  \n , ，").is_empty());
    }

    #[test]
    fn test_parse_plain_file_keeps_inner_spaces() {
        assert_eq!(parse_plain_file("a b\n c ,d\r\n"), vec!["a b", "c", "d"]);
    }

    #[test]
    fn test_source_from_extension() {
        assert_eq!(
            ImportSource::from_path(Path::new("list.XLSX")).unwrap(),
            ImportSource::Spreadsheet
        );
        assert_eq!(
            ImportSource::from_path(Path::new("list.csv")).unwrap(),
            ImportSource::Csv
        );
        assert_eq!(
            ImportSource::from_path(Path::new("list.txt")).unwrap(),
            ImportSource::PlainText
        );
        assert!(matches!(
            ImportSource::from_path(Path::new("list.pdf")),
            Err(TrackerError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            ImportSource::from_path(Path::new("list")),
            Err(TrackerError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_apply_counts_duplicate_within_batch() {
        let mut store = RowStore::new();
        let items = parse_text(&format!("{A},{A}, notanaddress"))
            .into_iter()
            .map(ImportItem::bare)
            .collect();
        let summary = apply(&mut store, items);
        assert_eq!(
            summary,
            ImportSummary {
                imported: 1,
                invalid: 1,
                duplicate: 1
            }
        );
        assert_eq!(store.len(), 1);
        assert_eq!(summary.message(), "Imported 1, 1 invalid, 1 duplicate");
    }

    #[test]
    fn test_apply_truncates_description() {
        let mut store = RowStore::new();
        let summary = apply(
            &mut store,
            vec![ImportItem {
                address: B.to_string(),
                description: "exchange hot wallet".to_string(),
            }],
        );
        assert_eq!(summary.imported, 1);
        assert_eq!(store.rows()[0].label, "exchan");
    }

    #[test]
    fn test_apply_against_existing_rows() {
        let mut store = RowStore::new();
        store.add_row(NewRow::with_address(A));
        let summary = apply(&mut store, vec![ImportItem::bare(A.to_lowercase())]);
        assert_eq!(summary.duplicate, 1);
        assert_eq!(summary.message(), "1 duplicate");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expand_path_resolves_home() {
        assert_eq!(expand_path(" ./list.csv "), PathBuf::from("./list.csv"));
        assert_eq!(expand_path("/tmp/geth.ipc"), PathBuf::from("/tmp/geth.ipc"));
        if let Some(dirs) = directories::BaseDirs::new() {
            assert_eq!(
                expand_path("~/.ethereum/geth.ipc"),
                dirs.home_dir().join(".ethereum/geth.ipc")
            );
        }
    }
}
