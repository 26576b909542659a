//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One asset known to the price provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetListing {
    /// Provider-specific identifier, e.g. `bitcoin`.
    pub id: String,
    /// Uppercase ticker, e.g. `BTC`.
    pub symbol: String,
}

/// External source of market prices.
///
/// Prices are resolved in two stages: the listing maps tickers to the
/// provider's own identifiers, and prices are then fetched per identifier.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Lists every asset the provider knows about.
    async fn list_assets(&self) -> Result<Vec<AssetListing>>;

    /// Latest USD price for a provider asset identifier.
    async fn fetch_price(&self, asset_id: &str) -> Result<f64>;
}
