//! CSV Export
//!
//! Writes the tracked table to a CSV file, one line per row.

use std::path::Path;

use crate::domain::Row;

/// Write rows to CSV file
pub fn write_rows(path: &Path, rows: &[Row]) -> Result<usize, Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)?;

    // Write header
    wtr.write_record(["#", "label", "address", "balance", "tx_count"])?;

    // Write data rows
    for (index, row) in rows.iter().enumerate() {
        wtr.write_record([
            (index + 1).to_string(),
            row.label.clone(),
            row.address.clone().unwrap_or_default(),
            row.balance.as_str().to_string(),
            row.tx_count.as_str().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Figure, RowId};

    #[test]
    fn test_write_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");

        let mut funded = Row::new(RowId(1));
        funded.label = "cold".to_string();
        funded.address = Some("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string());
        funded.balance = Figure::Value("1.5000".to_string());
        funded.tx_count = Figure::Value("12".to_string());
        let blank = Row::new(RowId(2));

        let count = write_rows(&path, &[funded, blank]).unwrap();
        assert_eq!(count, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#,label,address,balance,tx_count");
        assert_eq!(
            lines[1],
            "1,cold,0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045,1.5000,12"
        );
        assert_eq!(lines[2], "2,,,-,-");
    }
}
