use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A holding of one asset at the price paid for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>, quantity: f64, purchase_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            purchase_price,
        }
    }

    /// What the position cost when it was acquired.
    pub fn purchase_value(&self) -> f64 {
        self.quantity * self.purchase_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LotSide {
    Buy,
    Sell,
}

impl Display for LotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LotSide::Buy => "BUY",
                LotSide::Sell => "SELL",
            }
        )
    }
}

/// An executed buy or sell, priced at the market price of the moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub side: LotSide,
    pub executed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_value() {
        let position = Position::new("BTC", 0.5, 30000.0);
        assert_eq!(position.purchase_value(), 15000.0);
    }

    #[test]
    fn test_lot_side_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LotSide::Buy).unwrap(), "\"BUY\"");
        assert_eq!(LotSide::Sell.to_string(), "SELL");
    }
}
