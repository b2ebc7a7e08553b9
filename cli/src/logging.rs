//! Logging setup for the ciphergrid binary

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over the `--log-level` flag when set.
pub fn init(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().flatten_event(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))
}
