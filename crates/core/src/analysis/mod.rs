mod heuristic;

pub use heuristic::{analyze, daily_returns, mean_daily_return, recommend, Analysis};
