use super::util::{RetryPolicy, with_retry};
use crate::core::price::{AssetListing, PriceProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Price provider backed by a CoinCap-compatible REST API.
pub struct CoinCapProvider {
    base_url: Url,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl CoinCapProvider {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("cryptofolio/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid CoinCap base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Invalid CoinCap base URL: {base_url}"));
        }
        Ok(CoinCapProvider {
            base_url,
            client,
            retry,
        })
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid CoinCap base URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_text(&self, url: &Url) -> Result<String> {
        debug!("Requesting {}", url);
        let response = with_retry(
            || async { self.client.get(url.clone()).send().await?.error_for_status() },
            self.retry,
        )
        .await
        .with_context(|| format!("Request failed: {url}"))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to get response text from {url}"))
    }
}

#[derive(Debug, Deserialize)]
struct AssetsResponse {
    data: Vec<AssetEntry>,
}

#[derive(Debug, Deserialize)]
struct AssetEntry {
    id: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    data: AssetDetail,
}

#[derive(Debug, Deserialize)]
struct AssetDetail {
    #[serde(rename = "priceUsd")]
    price_usd: Option<UsdPrice>,
}

/// CoinCap encodes decimals as strings; accept plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UsdPrice {
    Number(f64),
    Text(String),
}

impl UsdPrice {
    fn value(&self) -> Result<f64> {
        let price = match self {
            UsdPrice::Number(n) => *n,
            UsdPrice::Text(s) => s
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid priceUsd: {s:?}"))?,
        };
        if !price.is_finite() || price < 0.0 {
            return Err(anyhow!("Invalid priceUsd: {price}"));
        }
        Ok(price)
    }
}

#[async_trait]
impl PriceProvider for CoinCapProvider {
    #[instrument(name = "CoinCapListAssets", skip(self))]
    async fn list_assets(&self) -> Result<Vec<AssetListing>> {
        let url = self.endpoint(&["assets"])?;
        let body = self.get_text(&url).await?;

        let parsed: AssetsResponse = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %body, "Failed to parse asset listing");
                return Err(e).context("Failed to parse asset listing");
            }
        };

        Ok(parsed
            .data
            .into_iter()
            .map(|entry| AssetListing {
                id: entry.id,
                symbol: entry.symbol.trim().to_uppercase(),
            })
            .collect())
    }

    #[instrument(name = "CoinCapPriceFetch", skip(self), fields(asset_id = %asset_id))]
    async fn fetch_price(&self, asset_id: &str) -> Result<f64> {
        let url = self.endpoint(&["assets", asset_id])?;
        let body = self.get_text(&url).await?;

        let parsed: AssetResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse price for {asset_id}. Response: '{body}'"))?;

        let price = parsed
            .data
            .price_usd
            .ok_or_else(|| anyhow!("No priceUsd for asset: {}", asset_id))?
            .value()?;
        debug!("Fetched price for {}: {}", asset_id, price);
        Ok(price)
    }
}
