use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use super::TracingConfig;

const DEFAULT_FILTER: &str = "info,fablecast=debug,tower_http=debug";

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; the format is chosen by `TracingConfig`.
pub fn init_tracing(config: TracingConfig, port: u16) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_format {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .init();
    }

    tracing::info!(
        port,
        environment = %config.environment,
        json = config.json_format,
        "Tracing initialized"
    );
}
