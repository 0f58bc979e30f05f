//! Aggregate figures for the stats panel

use num_format::{Locale, ToFormattedString};

use super::row::Row;

/// Below this the total is shown as "<0.0001"
pub const DUST_THRESHOLD: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub wallet_count: usize,
    pub total_balance: f64,
}

/// Count rows with a committed address and sum their balances.
/// Sentinels and unparsable text count as zero.
pub fn compute(rows: &[Row]) -> Stats {
    rows.iter()
        .filter(|row| row.has_address())
        .fold(Stats::default(), |mut stats, row| {
            stats.wallet_count += 1;
            stats.total_balance += row.balance.amount();
            stats
        })
}

/// Fiat price lookup state shown in the panel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FiatPrice {
    #[default]
    Loading,
    Unavailable,
    Price(f64),
}

impl Stats {
    pub fn balance_display(&self, unit: &str) -> String {
        if self.total_balance < DUST_THRESHOLD {
            format!("<{} {}", DUST_THRESHOLD, unit)
        } else {
            format!("{:.4} {}", self.total_balance, unit)
        }
    }

    pub fn fiat_value(&self, price: FiatPrice) -> Option<f64> {
        match price {
            FiatPrice::Price(price) => Some(self.total_balance * price),
            _ => None,
        }
    }

    pub fn fiat_display(&self, price: FiatPrice, symbol: &str) -> String {
        match price {
            FiatPrice::Loading => "loading...".to_string(),
            FiatPrice::Unavailable => "-".to_string(),
            FiatPrice::Price(_) => self
                .fiat_value(price)
                .map(|value| format!("{}{}", symbol, group_thousands(value)))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// `1234567.891` -> `1,234,567.89`
fn group_thousands(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_formatted_string(&Locale::en);
    let frac = cents % 100;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, whole, frac)
}
