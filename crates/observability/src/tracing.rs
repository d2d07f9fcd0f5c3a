//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Log level and output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Fallback filter when `RUST_LOG` is unset (e.g. "info", "hotelsupply_infra=debug").
    pub log_level: String,
    /// JSON lines when true, human-readable otherwise.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: true,
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` wins over `config.log_level`. Safe to call multiple times (subsequent
/// calls are no-ops).
pub fn init(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_a_noop() {
        let config = TelemetryConfig {
            log_level: "debug".to_string(),
            json: false,
        };
        init(&config);
        init(&config);
        ::tracing::debug!("still alive");
    }
}
