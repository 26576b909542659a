use crate::core::cache::Cache;
use crate::core::error::{WalletError, normalize_symbol};
use crate::core::price::PriceProvider;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Maps uppercase tickers to the price provider's asset identifiers.
///
/// Loaded from a single listing call the first time it is needed and only
/// grows afterwards. Two callers populating it at once both write the same
/// listing, so population needs no lock.
#[derive(Clone, Default)]
pub struct SymbolIndex {
    ids: Cache<String, String>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Loads the provider listing into the index.
    ///
    /// Existing entries are kept; a symbol listed twice keeps the first id seen.
    /// Returns the number of entries in the index afterwards.
    pub async fn populate(&self, provider: &dyn PriceProvider) -> Result<usize, WalletError> {
        let listings = provider
            .list_assets()
            .await
            .map_err(|e| WalletError::ProviderUnavailable(format!("{e:#}")))?;

        for listing in listings {
            let Ok(symbol) = normalize_symbol(&listing.symbol) else {
                debug!("Skipping listing {} with unusable symbol", listing.id);
                continue;
            };
            if listing.id.trim().is_empty() || self.ids.contains_key(&symbol) {
                continue;
            }
            self.ids.put(symbol, listing.id);
        }

        info!("Loaded symbol index with {} entries", self.ids.len());
        Ok(self.ids.len())
    }

    /// Populates the index only if it has no entries yet.
    pub async fn ensure_populated(&self, provider: &dyn PriceProvider) -> Result<(), WalletError> {
        if self.is_empty() {
            self.populate(provider).await?;
        }
        Ok(())
    }

    pub fn id_for(&self, symbol: &str) -> Option<String> {
        normalize_symbol(symbol)
            .ok()
            .and_then(|symbol| self.ids.get(&symbol))
    }

    /// Provider ids for the requested symbols that the index knows about.
    pub fn resolve(&self, symbols: &BTreeSet<String>) -> BTreeMap<String, String> {
        symbols
            .iter()
            .filter_map(|symbol| normalize_symbol(symbol).ok())
            .filter_map(|symbol| self.ids.get(&symbol).map(|id| (symbol, id)))
            .collect()
    }

    /// Drops every entry so the next refresh pass reloads the listing.
    pub fn invalidate(&self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::AssetListing;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ListingProvider {
        listings: Vec<AssetListing>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ListingProvider {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                listings: pairs
                    .iter()
                    .map(|(id, symbol)| AssetListing {
                        id: id.to_string(),
                        symbol: symbol.to_string(),
                    })
                    .collect(),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceProvider for ListingProvider {
        async fn list_assets(&self) -> Result<Vec<AssetListing>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("listing down"));
            }
            Ok(self.listings.clone())
        }

        async fn fetch_price(&self, _asset_id: &str) -> Result<f64> {
            Err(anyhow!("not used"))
        }
    }

    #[tokio::test]
    async fn test_populate_and_resolve() {
        let provider = ListingProvider::new(&[("bitcoin", "btc"), ("ethereum", "ETH")]);
        let index = SymbolIndex::new();

        assert_eq!(index.populate(&provider).await.unwrap(), 2);
        assert_eq!(index.id_for("BTC").as_deref(), Some("bitcoin"));
        assert_eq!(index.id_for("eth").as_deref(), Some("ethereum"));

        let wanted: BTreeSet<String> = ["btc", "DOGE"].iter().map(|s| s.to_string()).collect();
        let resolved = index.resolve(&wanted);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved["BTC"], "bitcoin");
    }

    #[tokio::test]
    async fn test_first_listing_wins_for_duplicate_symbols() {
        let provider = ListingProvider::new(&[("bitcoin", "BTC"), ("bitcoin-bep2", "BTC")]);
        let index = SymbolIndex::new();

        index.populate(&provider).await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.id_for("BTC").as_deref(), Some("bitcoin"));
    }

    #[tokio::test]
    async fn test_ensure_populated_lists_only_once() {
        let provider = ListingProvider::new(&[("bitcoin", "BTC")]);
        let index = SymbolIndex::new();

        index.ensure_populated(&provider).await.unwrap();
        index.ensure_populated(&provider).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        index.invalidate();
        assert!(index.is_empty());
        index.ensure_populated(&provider).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listing_failure_is_provider_unavailable() {
        let mut provider = ListingProvider::new(&[]);
        provider.fail = true;
        let index = SymbolIndex::new();

        let err = index.populate(&provider).await.unwrap_err();
        assert!(matches!(err, WalletError::ProviderUnavailable(_)));
        assert!(index.is_empty());
    }
}
