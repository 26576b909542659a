use crate::core::cache::PriceCache;
use crate::core::error::{WalletError, normalize_symbol, validate_quantity};
use crate::core::position::{Lot, LotSide, Position};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Persistence collaborator holding a wallet's positions and executed lots.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Symbols the refresher should keep warm.
    async fn load_all_tracked_symbols(&self) -> Result<BTreeSet<String>>;

    async fn load_positions(&self) -> Result<Vec<Position>>;

    async fn save_positions(&self, positions: Vec<Position>) -> Result<()>;

    async fn record_lot(&self, lot: Lot) -> Result<()>;

    async fn lots(&self) -> Result<Vec<Lot>>;
}

/// Failure of a wallet mutation: either a domain rule or the store.
#[derive(Debug, thiserror::Error)]
pub enum WalletServiceError {
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

fn validate(symbol: &str, quantity: f64) -> Result<String, WalletError> {
    let symbol = normalize_symbol(symbol)?;
    validate_quantity(&symbol, quantity)?;
    Ok(symbol)
}

/// Buys and sells against one wallet, pricing every lot from the cache.
///
/// Mutations are serialized: each one holds `mutation` from loading the
/// positions until its lot is recorded, so concurrent calls never overwrite
/// each other.
pub struct WalletService<S: PositionStore + ?Sized> {
    store: Arc<S>,
    prices: PriceCache,
    mutation: Mutex<()>,
}

impl<S: PositionStore + ?Sized> WalletService<S> {
    pub fn new(store: Arc<S>, prices: PriceCache) -> Self {
        Self {
            store,
            prices,
            mutation: Mutex::new(()),
        }
    }

    pub async fn positions(&self) -> Result<Vec<Position>, WalletServiceError> {
        Ok(self.store.load_positions().await?)
    }

    pub async fn tracked_symbols(&self) -> Result<BTreeSet<String>, WalletServiceError> {
        Ok(self.store.load_all_tracked_symbols().await?)
    }

    /// Saves `positions`, then records the lot. A failed save records nothing.
    async fn commit(&self, positions: Vec<Position>, lot: Lot) -> Result<(), WalletServiceError> {
        self.store.save_positions(positions).await?;
        self.store.record_lot(lot).await?;
        Ok(())
    }

    /// Adds `quantity` of `symbol` at the current cached price.
    ///
    /// An existing position keeps its purchase price and grows by
    /// `quantity`.
    pub async fn buy(&self, symbol: &str, quantity: f64) -> Result<Position, WalletServiceError> {
        let symbol = validate(symbol, quantity)?;
        let price = self.prices.fetch_latest_price(&symbol)?;

        let _guard = self.mutation.lock().await;
        let mut positions = self.store.load_positions().await?;
        let position = match positions
            .iter_mut()
            .find(|p| p.symbol.eq_ignore_ascii_case(&symbol))
        {
            Some(existing) => {
                existing.quantity += quantity;
                existing.clone()
            }
            None => {
                let position = Position::new(symbol.clone(), quantity, price);
                positions.push(position.clone());
                position
            }
        };

        let lot = Lot {
            symbol: symbol.clone(),
            quantity,
            price,
            side: LotSide::Buy,
            executed_at: Utc::now(),
        };
        self.commit(positions, lot).await?;

        info!("Bought {} {} at {}", quantity, symbol, price);
        Ok(position)
    }

    /// Removes `quantity` of `symbol`. Returns the remaining position, or
    /// `None` once the holding is fully sold.
    pub async fn sell(
        &self,
        symbol: &str,
        quantity: f64,
    ) -> Result<Option<Position>, WalletServiceError> {
        let symbol = validate(symbol, quantity)?;

        let _guard = self.mutation.lock().await;
        let mut positions = self.store.load_positions().await?;
        let index = positions
            .iter()
            .position(|p| p.symbol.eq_ignore_ascii_case(&symbol))
            .ok_or_else(|| WalletError::AssetNotFound(symbol.clone()))?;

        let held = positions[index].quantity;
        let remaining = held - quantity;
        if remaining < 0.0 {
            return Err(WalletError::InsufficientQuantity {
                symbol,
                held,
                requested: quantity,
            }
            .into());
        }

        let price = self.prices.fetch_latest_price(&symbol)?;

        let result = if remaining == 0.0 {
            debug!("Position {} fully sold, removing it", symbol);
            positions.remove(index);
            None
        } else {
            positions[index].quantity = remaining;
            Some(positions[index].clone())
        };

        let lot = Lot {
            symbol: symbol.clone(),
            quantity,
            price,
            side: LotSide::Sell,
            executed_at: Utc::now(),
        };
        self.commit(positions, lot).await?;

        info!("Sold {} {} at {}", quantity, symbol, price);
        Ok(result)
    }
}
