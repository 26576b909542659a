use crate::core::error::{WalletError, normalize_symbol, validate_quantity};
use crate::core::position::{Lot, Position};
use crate::core::refresh::DEFAULT_WORKERS;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_COINCAP_URL: &str = "https://api.coincap.io/v2";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WalletConfig {
    #[serde(default)]
    pub positions: Vec<Position>,
    /// Executed buys and sells, appended by the `buy` and `sell` commands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lots: Vec<Lot>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinCapProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coincap: Option<CoinCapProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coincap: Some(CoinCapProviderConfig {
                base_url: DEFAULT_COINCAP_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub workers: usize,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_secs: 60,
            workers: DEFAULT_WORKERS,
            retries: 2,
            retry_delay_ms: 250,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub wallet: WalletConfig,
    #[serde(default)]
    pub tracked_symbols: Vec<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl AppConfig {
    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "cryptofolio", "cryptofolio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Canonicalizes every symbol and rejects positions that could not be
    /// held: blank symbols, non-positive quantities, negative prices.
    pub fn validate(&mut self) -> Result<(), WalletError> {
        for position in &mut self.wallet.positions {
            let symbol = normalize_symbol(&position.symbol)?;
            validate_quantity(&symbol, position.quantity)?;
            if !position.purchase_price.is_finite() || position.purchase_price < 0.0 {
                return Err(WalletError::InvalidPrice(format!(
                    "purchase price for {symbol} must be 0 or more, got {}",
                    position.purchase_price
                )));
            }
            position.symbol = symbol;
        }
        for symbol in &mut self.tracked_symbols {
            *symbol = normalize_symbol(symbol)?;
        }
        Ok(())
    }

    /// Writes the config back to `path` as YAML. Comments in the file are not
    /// preserved.
    pub fn save_to_path<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config")?;
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .with_context(|| format!("Failed to write config file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace config file: {}", path.display()))?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn coincap_base_url(&self) -> &str {
        self.providers
            .coincap
            .as_ref()
            .map_or(DEFAULT_COINCAP_URL, |p| &p.base_url)
    }
}
