// src/logging.rs

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Fallback when neither `RUST_LOG` nor the config sets a filter.
const DEFAULT_FILTER: &str = "warn";

/// Initialise stderr logging.
///
/// Precedence: `RUST_LOG`, then `filter` (from config or `--log`), then `warn`.
/// Calling it twice is harmless; the second call is ignored.
pub fn init_logging(filter: Option<&str>) {
    let env_filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER))
    };

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(env_filter)
        .try_init();
}
