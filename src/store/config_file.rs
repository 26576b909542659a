use crate::core::config::AppConfig;
use crate::core::error::normalize_symbol;
use crate::core::position::{Lot, Position};
use crate::core::wallet::PositionStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// Position store that persists the wallet back into the YAML config file it
/// was loaded from.
pub struct ConfigFileStore {
    path: PathBuf,
    config: Mutex<AppConfig>,
}

impl ConfigFileStore {
    pub fn new(path: impl Into<PathBuf>, config: AppConfig) -> Self {
        Self {
            path: path.into(),
            config: Mutex::new(config),
        }
    }

    /// Applies `change` to a copy of the config and keeps it only if the file
    /// write succeeds.
    async fn update(&self, change: impl FnOnce(&mut AppConfig)) -> Result<()> {
        let mut config = self.config.lock().await;
        let mut updated = config.clone();
        change(&mut updated);
        updated.save_to_path(&self.path)?;
        *config = updated;
        Ok(())
    }
}

#[async_trait]
impl PositionStore for ConfigFileStore {
    async fn load_all_tracked_symbols(&self) -> Result<BTreeSet<String>> {
        let config = self.config.lock().await;
        Ok(config
            .wallet
            .positions
            .iter()
            .map(|p| p.symbol.as_str())
            .chain(config.tracked_symbols.iter().map(String::as_str))
            .filter_map(|symbol| normalize_symbol(symbol).ok())
            .collect())
    }

    async fn load_positions(&self) -> Result<Vec<Position>> {
        Ok(self.config.lock().await.wallet.positions.clone())
    }

    async fn save_positions(&self, positions: Vec<Position>) -> Result<()> {
        debug!("Writing {} positions to {}", positions.len(), self.path.display());
        self.update(|config| config.wallet.positions = positions).await
    }

    async fn record_lot(&self, lot: Lot) -> Result<()> {
        debug!("Recording {} lot for {}", lot.side, lot.symbol);
        self.update(|config| config.wallet.lots.push(lot)).await
    }

    async fn lots(&self) -> Result<Vec<Lot>> {
        Ok(self.config.lock().await.wallet.lots.clone())
    }
}
