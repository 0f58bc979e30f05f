//! Row records and their persisted snapshot form

use serde::{Deserialize, Serialize};

/// Longest label a row can carry, in characters
pub const LABEL_MAX_CHARS: usize = 6;

/// Stable handle for a row; survives reordering and deletion of others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);

/// A fetched figure or the sentinel standing in for it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Figure {
    #[default]
    Unfetched,
    Failed,
    Value(String),
}

impl Figure {
    pub const UNFETCHED: &'static str = "-";
    pub const FAILED: &'static str = "Failed";
    pub const LOADING: &'static str = "loading...";

    pub fn as_str(&self) -> &str {
        match self {
            Figure::Unfetched => Self::UNFETCHED,
            Figure::Failed => Self::FAILED,
            Figure::Value(value) => value,
        }
    }

    /// Read back a persisted display string. A stale loading marker
    /// means the fetch never finished, so it comes back as unfetched.
    pub fn from_display(text: &str) -> Self {
        match text.trim() {
            "" | Self::UNFETCHED | Self::LOADING => Figure::Unfetched,
            Self::FAILED => Figure::Failed,
            value => Figure::Value(value.to_string()),
        }
    }

    /// Numeric value for aggregation; sentinels count as zero
    pub fn amount(&self) -> f64 {
        match self {
            Figure::Value(value) => value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// One tracked account
#[derive(Debug, Clone)]
pub struct Row {
    pub id: RowId,
    pub label: String,
    /// Committed, validated address in checksummed form
    pub address: Option<String>,
    /// Last input the validator refused; the field shows it highlighted
    pub rejected_input: Option<String>,
    pub balance: Figure,
    pub tx_count: Figure,
    pub loading: bool,
    pub selected: bool,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            label: String::new(),
            address: None,
            rejected_input: None,
            balance: Figure::Unfetched,
            tx_count: Figure::Unfetched,
            loading: false,
            selected: false,
        }
    }

    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    pub fn balance_display(&self) -> &str {
        if self.loading {
            Figure::LOADING
        } else {
            self.balance.as_str()
        }
    }

    pub fn tx_count_display(&self) -> &str {
        if self.loading {
            Figure::LOADING
        } else {
            self.tx_count.as_str()
        }
    }
}

/// Truncate free text to the label bound, counting characters not bytes
pub fn clamp_label(text: &str) -> String {
    text.trim().chars().take(LABEL_MAX_CHARS).collect()
}

/// Initial data for a new row
#[derive(Debug, Clone, Default)]
pub struct NewRow {
    pub address: Option<String>,
    pub label: String,
    pub balance: Figure,
    pub tx_count: Figure,
}

impl NewRow {
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }
}

/// A row's committed address, handed to the batch querier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub id: RowId,
    pub address: String,
}

/// Durable form of one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub tx_count: String,
}

impl From<SnapshotEntry> for NewRow {
    fn from(entry: SnapshotEntry) -> Self {
        Self {
            address: Some(entry.address),
            label: entry.description,
            balance: Figure::from_display(&entry.balance),
            tx_count: Figure::from_display(&entry.tx_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_display_round_trip() {
        assert_eq!(Figure::from_display("-"), Figure::Unfetched);
        assert_eq!(Figure::from_display("loading..."), Figure::Unfetched);
        assert_eq!(Figure::from_display("Failed"), Figure::Failed);
        assert_eq!(
            Figure::from_display("1.2500"),
            Figure::Value("1.2500".to_string())
        );
        assert_eq!(Figure::Failed.amount(), 0.0);
        assert_eq!(Figure::Value("2.5".into()).amount(), 2.5);
        assert_eq!(Figure::Value("abc".into()).amount(), 0.0);
    }

    #[test]
    fn test_clamp_label_counts_chars() {
        assert_eq!(clamp_label("cold wallet"), "cold w");
        assert_eq!(clamp_label("冷钱包一号二号"), "冷钱包一号二");
        assert_eq!(clamp_label("  hot "), "hot");
    }

    #[test]
    fn test_snapshot_field_names() {
        let entry = SnapshotEntry {
            address: "0xabc".into(),
            description: "main".into(),
            balance: "1.0000".into(),
            tx_count: "7".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"txCount\":\"7\""));
        assert!(json.contains("\"description\":\"main\""));
    }

    #[test]
    fn test_loading_masks_figures() {
        let mut row = Row::new(RowId(1));
        row.balance = Figure::Value("3.0000".into());
        row.loading = true;
        assert_eq!(row.balance_display(), "loading...");
        row.loading = false;
        assert_eq!(row.balance_display(), "3.0000");
    }
}
