pub mod provider;
pub mod types;
pub mod yahoo;

pub use provider::{normalize_symbol, HistoryRange, MarketDataProvider};
pub use yahoo::YahooFinanceClient;
