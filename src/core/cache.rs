use crate::core::error::{WalletError, normalize_symbol};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Concurrent key-value cache shared between the refresher and readers.
///
/// Values are replaced whole on `put`, so a reader sees either the previous or
/// the new value. Readers and writers only contend on the shard holding the key.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<DashMap<K, V>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.inner.get(key).map(|entry| entry.value().clone());
        if value.is_some() {
            debug!("Cache HIT for key: {:?}", key);
        } else {
            debug!("Cache MISS for key: {:?}", key);
        }
        value
    }

    pub fn put(&self, key: K, value: V) {
        debug!("Cache PUT for key: {:?}", key);
        self.inner.insert(key, value);
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> Vec<K> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn clear(&self) {
        self.inner.clear();
        debug!("Cache CLEAR");
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Last successfully fetched price for a symbol.
///
/// An entry only exists once a fetch succeeded; a later failed fetch leaves it
/// in place, so `updated_at` tells a caller how stale it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedPrice {
    pub price: f64,
    pub updated_at: DateTime<Utc>,
}

/// Latest USD price per uppercase symbol.
#[derive(Clone, Default)]
pub struct PriceCache {
    prices: Cache<String, CachedPrice>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry, or `PriceUnavailable` if the symbol was never
    /// refreshed successfully.
    pub fn get(&self, symbol: &str) -> Result<CachedPrice, WalletError> {
        let symbol = normalize_symbol(symbol)?;
        self.prices
            .get(&symbol)
            .ok_or(WalletError::PriceUnavailable(symbol))
    }

    /// Latest known price for `symbol`, case-insensitively.
    pub fn fetch_latest_price(&self, symbol: &str) -> Result<f64, WalletError> {
        self.get(symbol).map(|cached| cached.price)
    }

    pub fn put(&self, symbol: &str, price: f64) -> Result<(), WalletError> {
        let symbol = normalize_symbol(symbol)?;
        self.prices.put(
            symbol,
            CachedPrice {
                price,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Point-in-time copy of every cached price, ordered by symbol.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.prices
            .keys()
            .into_iter()
            .filter_map(|symbol| {
                self.prices
                    .get(&symbol)
                    .map(|cached| (symbol, cached.price))
            })
            .collect()
    }
}
