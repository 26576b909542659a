pub mod price;
pub mod setup;
pub mod summary;
pub mod trade;
pub mod ui;
pub mod watch;
