use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::rate_limit::GateConfig;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "stock-history-api")]
#[command(about = "Historical stock price API with per-key request quotas")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // The one accepted API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    // Directory holding companies.csv and stocks_history.csv
    #[arg(short, long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    // Max admitted requests per key per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 10)]
    pub rate_window: u64,

    // Seconds a key may stay unseen before its window is dropped
    #[arg(long, env = "RATE_IDLE_TTL", default_value_t = 60)]
    pub rate_idle_ttl: u64,

    // Origins allowed to call the API from a browser (comma-separated)
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    // Idle window sweep interval in seconds
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval: u64,
}

impl Args {
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            limit: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
            idle_ttl: Duration::from_secs(self.rate_idle_ttl),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}
