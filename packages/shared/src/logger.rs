//! Logger setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it, the filter falls back to
/// `<crate>=<default_level>,tower_http=<default_level>` where `<crate>` is
/// derived from the binary name (`kyoshitsu-server` -> `kyoshitsu_server`).
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let crate_name = bin_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{crate_name}={default_level},kyoshitsu_shared={default_level},tower_http={default_level}"
        ))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logger_twice_does_not_panic() {
        // テスト項目: setup_logger を複数回呼んでも panic しない
        // when (操作):
        setup_logger("kyoshitsu-server", "debug");
        setup_logger("kyoshitsu-server", "info");

        // then (期待する結果):
        tracing::info!("logger initialized");
    }
}
