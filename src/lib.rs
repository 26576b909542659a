pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{
    PositionStore, PriceCache, Refresher, SymbolIndex, ValuationEngine, WalletService,
};
use crate::providers::{CoinCapProvider, RetryPolicy};
use crate::store::{ConfigFileStore, MemoryStore};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Summary,
    Price(String),
    Watch,
    Buy { symbol: String, quantity: f64 },
    Sell { symbol: String, quantity: f64 },
}

/// Everything a command needs, wired from one config. Owned by the caller and
/// passed down explicitly.
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn PositionStore>,
    pub refresher: Arc<Refresher>,
    pub valuation: ValuationEngine,
    pub wallet: WalletService<dyn PositionStore>,
}

impl AppContext {
    /// Wires a context whose wallet lives only in memory.
    pub fn from_config(mut config: AppConfig) -> Result<Self> {
        config.validate()?;
        let store = MemoryStore::new(
            config.wallet.positions.clone(),
            config.tracked_symbols.clone(),
        );
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(mut config: AppConfig, store: Arc<dyn PositionStore>) -> Result<Self> {
        config.validate()?;
        let retry = RetryPolicy::new(config.refresh.retries, config.refresh.retry_delay_ms);
        let provider = Arc::new(CoinCapProvider::new(config.coincap_base_url(), retry)?);

        let prices = PriceCache::new();
        let refresher = Refresher::new(provider, SymbolIndex::new(), prices.clone())
            .with_workers(config.refresh.workers);

        Ok(Self {
            wallet: WalletService::new(store.clone(), prices.clone()),
            store,
            refresher: Arc::new(refresher),
            valuation: ValuationEngine::new(prices),
            config,
        })
    }

    pub fn prices(&self) -> &PriceCache {
        self.refresher.prices()
    }

    /// Runs one refresh pass over every tracked symbol.
    pub async fn refresh_once(&self) -> Result<usize> {
        let tracked = self.store.load_all_tracked_symbols().await?;
        Ok(self.refresher.run_pass(&tracked).await)
    }

    /// Runs one refresh pass over the tracked symbols plus `symbol`.
    pub async fn refresh_with(&self, symbol: &str) -> Result<usize> {
        let mut tracked = self.store.load_all_tracked_symbols().await?;
        tracked.insert(symbol.to_string());
        Ok(self.refresher.run_pass(&tracked).await)
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cryptofolio starting...");

    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_config_path()?,
    };
    let config = AppConfig::load_from_path(&path)?;
    debug!("Loaded config: {config:#?}");

    let store = Arc::new(ConfigFileStore::new(path, config.clone()));
    let ctx = AppContext::with_store(config, store)?;

    match command {
        AppCommand::Summary => cli::summary::run(&ctx).await,
        AppCommand::Price(symbol) => cli::price::run(&ctx, &symbol).await,
        AppCommand::Watch => cli::watch::run(&ctx).await,
        AppCommand::Buy { symbol, quantity } => cli::trade::buy(&ctx, &symbol, quantity).await,
        AppCommand::Sell { symbol, quantity } => cli::trade::sell(&ctx, &symbol, quantity).await,
    }
}
