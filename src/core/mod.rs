//! Price cache, refresh and valuation core

pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod position;
pub mod price;
pub mod refresh;
pub mod symbol;
pub mod valuation;
pub mod wallet;

// Re-export main types for cleaner imports
pub use cache::PriceCache;
pub use error::WalletError;
pub use position::{Lot, LotSide, Position};
pub use price::{AssetListing, PriceProvider};
pub use refresh::Refresher;
pub use symbol::SymbolIndex;
pub use valuation::{GrowthResult, ValuationEngine, WalletValuation};
pub use wallet::{PositionStore, WalletService};
