pub mod coincap;
pub mod util;

pub use coincap::CoinCapProvider;
pub use util::RetryPolicy;
