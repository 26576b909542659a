//! Aggregates wallet positions into purchase-cost and market-value totals and
//! ranks assets by growth rate.
//!
//! Positions are grouped by canonical symbol before anything is summed, and
//! every grouping is ordered by symbol so rankings are reproducible: among
//! assets with equal growth the alphabetically first one wins.
use crate::core::cache::PriceCache;
use crate::core::error::{WalletError, normalize_symbol};
use crate::core::position::Position;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use tracing::debug;

/// Decimal places kept on reported growth percentages.
pub const GROWTH_RATE_DP: u32 = 2;

/// Growth of one symbol's aggregated position, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthResult {
    pub symbol: String,
    pub growth_rate: f64,
}

/// Per-symbol line of a wallet valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetValuation {
    pub symbol: String,
    pub quantity: f64,
    pub purchase_value: f64,
    pub current_price: Option<f64>,
    pub current_value: Option<f64>,
    pub growth_rate: Option<f64>,
}

/// Full valuation of a wallet against the prices cached at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletValuation {
    pub assets: Vec<AssetValuation>,
    pub total_purchase_value: f64,
    pub total_current_value: f64,
    pub best: Option<GrowthResult>,
    pub worst: Option<GrowthResult>,
}

/// Rounds the exact binary value of `value` to `dp` decimal places, ties away
/// from zero. `1.005` is slightly below the midpoint and rounds to `1.0`.
pub fn round_half_up(value: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

fn raw_growth_rate(purchase: f64, current: f64) -> f64 {
    ((current - purchase) * 100.0) / purchase
}

#[derive(Debug, Default, Clone, Copy)]
struct Holding {
    quantity: f64,
    purchase_value: f64,
}

/// Symbol to price, as copied out of the cache at one instant.
pub type PriceSnapshot = BTreeMap<String, f64>;

fn price_of(prices: &PriceSnapshot, symbol: &str) -> Result<f64, WalletError> {
    prices
        .get(symbol)
        .copied()
        .ok_or_else(|| WalletError::PriceUnavailable(symbol.to_string()))
}

/// Reads prices from a shared [`PriceCache`]; never performs I/O.
///
/// Each public call takes a single [`PriceCache::snapshot`] and computes
/// everything from it, so a refresh landing mid-call cannot mix old and new
/// prices in one result.
#[derive(Clone)]
pub struct ValuationEngine {
    prices: PriceCache,
}

impl ValuationEngine {
    pub fn new(prices: PriceCache) -> Self {
        Self { prices }
    }

    fn group(&self, positions: &[Position]) -> BTreeMap<String, Holding> {
        let mut holdings: BTreeMap<String, Holding> = BTreeMap::new();
        for position in positions {
            let Ok(symbol) = normalize_symbol(&position.symbol) else {
                debug!("Ignoring position with invalid symbol {:?}", position.symbol);
                continue;
            };
            let holding = holdings.entry(symbol).or_default();
            holding.quantity += position.quantity;
            holding.purchase_value += position.purchase_value();
        }
        holdings
    }

    /// Purchase cost per symbol.
    pub fn purchase_values(&self, positions: &[Position]) -> BTreeMap<String, f64> {
        self.group(positions)
            .into_iter()
            .map(|(symbol, holding)| (symbol, holding.purchase_value))
            .collect()
    }

    fn current_values_at(
        &self,
        positions: &[Position],
        prices: &PriceSnapshot,
    ) -> BTreeMap<String, f64> {
        self.group(positions)
            .into_iter()
            .filter_map(|(symbol, holding)| match price_of(prices, &symbol) {
                Ok(price) => Some((symbol, holding.quantity * price)),
                Err(e) => {
                    debug!("Excluding {} from current value: {}", symbol, e);
                    None
                }
            })
            .collect()
    }

    /// Market value per symbol. Symbols without a cached price are left out.
    pub fn current_values(&self, positions: &[Position]) -> BTreeMap<String, f64> {
        self.current_values_at(positions, &self.prices.snapshot())
    }

    pub fn total_purchase_value(&self, positions: &[Position]) -> f64 {
        self.purchase_values(positions).values().sum()
    }

    pub fn total_current_value(&self, positions: &[Position]) -> f64 {
        self.current_values(positions).values().sum()
    }

    /// Unrounded growth per rankable symbol, ordered by symbol.
    fn raw_growth_rates(
        &self,
        positions: &[Position],
        prices: &PriceSnapshot,
    ) -> Vec<(String, f64)> {
        let purchase = self.purchase_values(positions);
        self.current_values_at(positions, prices)
            .into_iter()
            .filter_map(|(symbol, current)| match purchase.get(&symbol) {
                Some(&cost) if cost > 0.0 => Some((symbol, raw_growth_rate(cost, current))),
                _ => None,
            })
            .collect()
    }

    /// Rounded growth of every symbol that has both a cost basis and a price.
    pub fn growth_rates(&self, positions: &[Position]) -> Vec<GrowthResult> {
        self.raw_growth_rates(positions, &self.prices.snapshot())
            .into_iter()
            .map(|(symbol, rate)| GrowthResult {
                symbol,
                growth_rate: round_half_up(rate, GROWTH_RATE_DP),
            })
            .collect()
    }

    /// Growth of a single symbol's aggregated position.
    pub fn growth_rate(
        &self,
        positions: &[Position],
        symbol: &str,
    ) -> Result<GrowthResult, WalletError> {
        let symbol = normalize_symbol(symbol)?;
        let holding = self
            .group(positions)
            .remove(&symbol)
            .ok_or_else(|| WalletError::AssetNotFound(symbol.clone()))?;
        if holding.purchase_value <= 0.0 {
            return Err(WalletError::NoEligibleAsset);
        }
        let price = self.prices.fetch_latest_price(&symbol)?;
        let rate = raw_growth_rate(holding.purchase_value, holding.quantity * price);
        Ok(GrowthResult {
            symbol,
            growth_rate: round_half_up(rate, GROWTH_RATE_DP),
        })
    }

    /// Picks the symbol the comparator prefers, keeping the earlier one on ties.
    fn pick(
        &self,
        positions: &[Position],
        prices: &PriceSnapshot,
        keep_current: impl Fn(f64, f64) -> bool,
    ) -> Result<GrowthResult, WalletError> {
        self.raw_growth_rates(positions, prices)
            .into_iter()
            .reduce(|kept, candidate| {
                if keep_current(kept.1, candidate.1) {
                    kept
                } else {
                    candidate
                }
            })
            .map(|(symbol, rate)| GrowthResult {
                symbol,
                growth_rate: round_half_up(rate, GROWTH_RATE_DP),
            })
            .ok_or(WalletError::NoEligibleAsset)
    }

    fn best_at(
        &self,
        positions: &[Position],
        prices: &PriceSnapshot,
    ) -> Result<GrowthResult, WalletError> {
        self.pick(positions, prices, |kept, candidate| kept >= candidate)
    }

    fn worst_at(
        &self,
        positions: &[Position],
        prices: &PriceSnapshot,
    ) -> Result<GrowthResult, WalletError> {
        self.pick(positions, prices, |kept, candidate| kept <= candidate)
    }

    pub fn best_performing(&self, positions: &[Position]) -> Result<GrowthResult, WalletError> {
        self.best_at(positions, &self.prices.snapshot())
    }

    pub fn worst_performing(&self, positions: &[Position]) -> Result<GrowthResult, WalletError> {
        self.worst_at(positions, &self.prices.snapshot())
    }

    /// Per-symbol lines plus totals and best/worst performers, all from one
    /// snapshot of the cache.
    pub fn valuate(&self, positions: &[Position]) -> WalletValuation {
        self.valuate_at(positions, &self.prices.snapshot())
    }

    /// Same as [`valuate`](Self::valuate) against caller-supplied prices.
    pub fn valuate_at(&self, positions: &[Position], prices: &PriceSnapshot) -> WalletValuation {
        let assets: Vec<AssetValuation> = self
            .group(positions)
            .into_iter()
            .map(|(symbol, holding)| {
                let current_price = price_of(prices, &symbol).ok();
                let current_value = current_price.map(|price| holding.quantity * price);
                let growth_rate = current_value
                    .filter(|_| holding.purchase_value > 0.0)
                    .map(|value| {
                        round_half_up(
                            raw_growth_rate(holding.purchase_value, value),
                            GROWTH_RATE_DP,
                        )
                    });
                AssetValuation {
                    symbol,
                    quantity: holding.quantity,
                    purchase_value: holding.purchase_value,
                    current_price,
                    current_value,
                    growth_rate,
                }
            })
            .collect();

        WalletValuation {
            total_purchase_value: assets.iter().map(|a| a.purchase_value).sum(),
            total_current_value: assets.iter().filter_map(|a| a.current_value).sum(),
            best: self.best_at(positions, prices).ok(),
            worst: self.worst_at(positions, prices).ok(),
            assets,
        }
    }
}
