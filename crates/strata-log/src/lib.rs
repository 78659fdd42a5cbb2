//! Structured logging setup for hosts embedding the store.
//!
//! The store itself only emits `tracing` events; this crate wires up a
//! subscriber with console output and environment-based filtering for hosts
//! (and integration harnesses) that do not bring their own.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Filtering follows `RUST_LOG` when set, otherwise `default_filter`
/// (falling back to `info`). Output goes to the console with module targets
/// and an uptime timer.
///
/// # Examples
///
/// ```no_run
/// strata_log::init_logging(None);
/// strata_log::init_logging(Some("debug,strata_voxel=trace"));
/// ```
pub fn init_logging(default_filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or("info")));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_enables_info() {
        let filter = default_env_filter();
        assert!(format!("{}", filter).contains("info"));
    }

    #[test]
    fn test_per_crate_filter_parses() {
        let filters = [
            "info",
            "debug,strata_voxel=trace",
            "warn,strata_world=debug",
            "error",
        ];
        for filter_str in filters {
            assert!(
                EnvFilter::try_new(filter_str).is_ok(),
                "failed to parse filter: {filter_str}"
            );
        }
    }
}
