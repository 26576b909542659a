use crate::core::error::normalize_symbol;
use crate::core::position::{Lot, Position};
use crate::core::wallet::PositionStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct WalletState {
    positions: Vec<Position>,
    lots: Vec<Lot>,
}

/// In-process position store, seeded from the config file
pub struct MemoryStore {
    state: Mutex<WalletState>,
    extra_tracked: BTreeSet<String>,
}

impl MemoryStore {
    /// Creates a store holding `positions`. `extra_tracked` lists symbols to keep
    /// priced even when no position holds them.
    pub fn new(positions: Vec<Position>, extra_tracked: Vec<String>) -> Self {
        let extra_tracked = extra_tracked
            .iter()
            .filter_map(|symbol| normalize_symbol(symbol).ok())
            .collect();
        Self {
            state: Mutex::new(WalletState {
                positions,
                lots: Vec::new(),
            }),
            extra_tracked,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn load_all_tracked_symbols(&self) -> Result<BTreeSet<String>> {
        let state = self.state.lock().await;
        let mut symbols = self.extra_tracked.clone();
        symbols.extend(
            state
                .positions
                .iter()
                .filter_map(|p| normalize_symbol(&p.symbol).ok()),
        );
        Ok(symbols)
    }

    async fn load_positions(&self) -> Result<Vec<Position>> {
        Ok(self.state.lock().await.positions.clone())
    }

    async fn save_positions(&self, positions: Vec<Position>) -> Result<()> {
        let mut state = self.state.lock().await;
        debug!("Saving {} positions", positions.len());
        state.positions = positions;
        Ok(())
    }

    async fn record_lot(&self, lot: Lot) -> Result<()> {
        let mut state = self.state.lock().await;
        debug!("Recording {} lot for {}", lot.side, lot.symbol);
        state.lots.push(lot);
        Ok(())
    }

    async fn lots(&self) -> Result<Vec<Lot>> {
        Ok(self.state.lock().await.lots.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::LotSide;
    use chrono::Utc;

    #[tokio::test]
    async fn test_tracked_symbols_merge_positions_and_extras() {
        let store = MemoryStore::new(
            vec![
                Position::new("btc", 1.0, 30000.0),
                Position::new("ETH", 2.0, 1500.0),
            ],
            vec!["sol".to_string(), "BTC".to_string(), " ".to_string()],
        );

        let symbols: Vec<_> = store
            .load_all_tracked_symbols()
            .await
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(symbols, vec!["BTC", "ETH", "SOL"]);
    }

    #[tokio::test]
    async fn test_save_positions_and_record_lots() {
        let store = MemoryStore::default();
        assert!(store.load_positions().await.unwrap().is_empty());

        store
            .save_positions(vec![Position::new("XRP", 100.0, 0.5)])
            .await
            .unwrap();
        store
            .record_lot(Lot {
                symbol: "XRP".to_string(),
                quantity: 100.0,
                price: 0.5,
                side: LotSide::Buy,
                executed_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(store.load_positions().await.unwrap().len(), 1);
        assert_eq!(store.lots().await.unwrap()[0].side, LotSide::Buy);
        assert_eq!(
            store.load_all_tracked_symbols().await.unwrap().len(),
            1
        );
    }
}
