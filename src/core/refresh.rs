use crate::core::cache::PriceCache;
use crate::core::price::PriceProvider;
use crate::core::symbol::SymbolIndex;
use crate::core::wallet::PositionStore;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// Concurrent price lookups per refresh pass.
pub const DEFAULT_WORKERS: usize = 3;

/// Keeps the [`PriceCache`] warm for a set of tracked symbols.
///
/// A pass never fails: a listing failure ends it with zero updates and a
/// failed lookup leaves that symbol's previous price in the cache.
pub struct Refresher {
    provider: Arc<dyn PriceProvider>,
    index: SymbolIndex,
    prices: PriceCache,
    workers: usize,
}

impl Refresher {
    pub fn new(provider: Arc<dyn PriceProvider>, index: SymbolIndex, prices: PriceCache) -> Self {
        Self {
            provider,
            index,
            prices,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn prices(&self) -> &PriceCache {
        &self.prices
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Runs one refresh pass over `tracked` and returns how many symbols got a
    /// new price.
    #[instrument(name = "RefreshPass", skip_all, fields(tracked = tracked.len()))]
    pub async fn run_pass(&self, tracked: &BTreeSet<String>) -> usize {
        if let Err(e) = self.index.ensure_populated(self.provider.as_ref()).await {
            warn!(error = %e, "Symbol index unavailable, keeping cached prices");
            return 0;
        }

        let targets = self.index.resolve(tracked);
        if targets.len() < tracked.len() {
            let unresolved: Vec<_> = tracked
                .iter()
                .filter(|s| self.index.id_for(s).is_none())
                .collect();
            debug!("Symbols unknown to the provider: {:?}", unresolved);
        }

        let provider = self.provider.as_ref();
        let prices = &self.prices;
        let attempted = targets.len();
        let updated = stream::iter(targets)
            .map(|(symbol, asset_id)| async move {
                match provider.fetch_price(&asset_id).await {
                    Ok(price) => match prices.put(&symbol, price) {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(symbol = %symbol, error = %e, "Discarding fetched price");
                            false
                        }
                    },
                    Err(e) => {
                        warn!(
                            symbol = %symbol,
                            asset_id = %asset_id,
                            error = %e,
                            "Price fetch failed, keeping cached value"
                        );
                        false
                    }
                }
            })
            .buffer_unordered(self.workers)
            .filter(|ok| futures::future::ready(*ok))
            .count()
            .await;

        info!("Refresh pass updated {}/{} symbols", updated, attempted);
        updated
    }

    /// Runs a pass every `period` over the symbols `store` tracks at that tick.
    ///
    /// The update count of each finished pass is sent on the returned channel;
    /// dropping the receiver does not stop the task, aborting the handle does.
    pub fn spawn_periodic(
        self: Arc<Self>,
        period: Duration,
        store: Arc<dyn PositionStore>,
    ) -> (JoinHandle<()>, mpsc::UnboundedReceiver<usize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tracked = match store.load_all_tracked_symbols().await {
                    Ok(tracked) => tracked,
                    Err(e) => {
                        warn!(error = %e, "Could not load tracked symbols, skipping tick");
                        continue;
                    }
                };
                let updated = self.run_pass(&tracked).await;
                let _ = tx.send(updated);
            }
        });
        (handle, rx)
    }
}
