mod health;
mod metrics;
mod stocks;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use stocks::{multiple_stocks_handler, single_stock_handler};
