//! Server configuration (command line flags with environment fallbacks).

use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;

/// Kyoshitsu live polling server
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "kyoshitsu-server", version, about = "Live classroom polling server")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, env = "KYOSHITSU_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "KYOSHITSU_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "KYOSHITSU_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Countdown tick interval in milliseconds
    #[arg(
        long,
        env = "KYOSHITSU_TICK_INTERVAL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub tick_interval_ms: u64,

    /// Chat messages older than this many days are purged
    #[arg(long, env = "KYOSHITSU_CHAT_RETENTION_DAYS", default_value_t = 7)]
    pub chat_retention_days: u32,

    /// Interval in seconds between chat retention sweeps
    #[arg(
        long,
        env = "KYOSHITSU_RETENTION_SWEEP_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub retention_sweep_secs: u64,

    /// Origins allowed to call the HTTP API (comma separated). Any origin when empty.
    #[arg(
        long,
        env = "KYOSHITSU_CORS_ORIGINS",
        value_delimiter = ',',
        value_parser = parse_origin
    )]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            tick_interval_ms: 1000,
            chat_retention_days: 7,
            retention_sweep_secs: 3600,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retention_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention_sweep_secs)
    }
}

fn parse_origin(raw: &str) -> Result<String, String> {
    let origin = raw.trim();
    if origin.is_empty() {
        return Err("origin must not be empty".to_string());
    }
    HeaderValue::from_str(origin)
        .map(|_| origin.to_string())
        .map_err(|e| format!("invalid origin {origin:?}: {e}"))
}
