//! Live classroom polling server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kyoshitsu-server -- --port 5000
//! ```

use clap::Parser;
use kyoshitsu_server::ServerConfig;
use kyoshitsu_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = kyoshitsu_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
