//! Best-effort fiat price lookup (CoinGecko simple-price format)

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// `{ "<asset>": { "<fiat>": number } }`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

#[derive(Debug, Clone)]
pub struct PriceFeed {
    http: reqwest::Client,
    url: String,
    asset: String,
    fiat: String,
}

impl PriceFeed {
    pub fn new(url: &str, asset: &str, fiat: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            url: url.to_string(),
            asset: asset.to_lowercase(),
            fiat: fiat.to_lowercase(),
        })
    }

    /// Price of one unit of the asset, or `None` when the feed is
    /// unreachable or answers with something unexpected.
    pub async fn price_in_fiat(&self) -> Option<f64> {
        match self.fetch().await {
            Ok(price) => price,
            Err(err) => {
                log::warn!("price feed unavailable: {:#}", err);
                None
            }
        }
    }

    async fn fetch(&self) -> Result<Option<f64>> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("ids", self.asset.as_str()), ("vs_currencies", self.fiat.as_str())])
            .send()
            .await
            .context("price request failed")?
            .error_for_status()
            .context("price feed returned an error status")?;
        let quotes: SimplePriceResponse = response
            .json()
            .await
            .context("price body is not a simple-price quote")?;
        Ok(select_price(&quotes, &self.asset, &self.fiat))
    }
}

pub fn parse_price(body: &str, asset: &str, fiat: &str) -> Option<f64> {
    let quotes: SimplePriceResponse = serde_json::from_str(body).ok()?;
    select_price(&quotes, asset, fiat)
}

fn select_price(quotes: &SimplePriceResponse, asset: &str, fiat: &str) -> Option<f64> {
    quotes
        .get(asset)
        .and_then(|quotes| quotes.get(fiat))
        .copied()
        .filter(|price| price.is_finite() && *price > 0.0)
}
