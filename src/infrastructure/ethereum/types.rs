//! Display conversions for chain amounts

use alloy::primitives::U256;

/// Native unit for display
pub const NATIVE_SYMBOL: &str = "ETH";

/// Wei to ETH as f64 (for display)
pub fn wei_to_eth(wei: U256) -> f64 {
    let eth_in_wei = U256::from(1_000_000_000_000_000_000u64);
    let whole = wei / eth_in_wei;
    let frac = wei % eth_in_wei;

    let whole_f64: f64 = whole.to_string().parse().unwrap_or(0.0);
    let frac_f64: f64 = frac.to_string().parse().unwrap_or(0.0);

    whole_f64 + frac_f64 / 1e18
}

/// Balance cell text: ETH with four decimals
pub fn format_balance(wei: U256) -> String {
    format!("{:.4}", wei_to_eth(wei))
}
