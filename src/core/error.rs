//! Typed failures surfaced by the pricing and valuation core.

use thiserror::Error;

/// Errors a caller of the core can act on.
///
/// Adapter failures (HTTP, JSON) stay `anyhow::Error` inside the providers and
/// are folded into [`WalletError::ProviderUnavailable`] where they cross into the
/// core. Nothing here is fatal to the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    /// Blank or malformed symbol at a cache or wallet boundary.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Zero, negative or non-finite quantity on a position mutation.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Negative or non-finite purchase price on a configured position.
    #[error("Invalid purchase price: {0}")]
    InvalidPrice(String),

    /// The asset listing could not be loaded from the price provider.
    #[error("Price provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// No price has been cached for this symbol yet.
    #[error("Price not available for symbol: {0}")]
    PriceUnavailable(String),

    /// Ranking was requested over a wallet with no symbol that has a cost basis
    /// and a current price.
    #[error("No eligible asset to rank")]
    NoEligibleAsset,

    #[error("Asset {0} not found in the wallet")]
    AssetNotFound(String),

    #[error("Cannot remove {requested} {symbol}, only {held} held")]
    InsufficientQuantity {
        symbol: String,
        held: f64,
        requested: f64,
    },
}

/// Canonicalizes a ticker: trims surrounding whitespace and uppercases it.
///
/// Every boundary that accepts a symbol goes through here so `"btc"`, `" BTC "`
/// and `"BTC"` address the same entry.
pub fn normalize_symbol(symbol: &str) -> Result<String, WalletError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(WalletError::InvalidSymbol(symbol.to_string()));
    }
    Ok(trimmed.to_uppercase())
}

/// Rejects zero, negative and non-finite quantities of `symbol`.
pub fn validate_quantity(symbol: &str, quantity: f64) -> Result<(), WalletError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(WalletError::InvalidQuantity(format!(
            "quantity for {symbol} must be greater than 0, got {quantity}"
        )));
    }
    Ok(())
}
