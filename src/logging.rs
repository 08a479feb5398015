use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`; production logs are JSON.
pub fn init(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.environment.is_production() {
        builder.json().with_current_span(false).init();
    } else {
        builder.init();
    }
}
