//! Tracing/logging setup shared by every binary or test harness embedding the core.

pub mod tracing;

pub use crate::tracing::TelemetryConfig;

/// Initialize process-wide tracing with the default configuration.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&TelemetryConfig::default());
}

/// Initialize process-wide tracing from explicit settings.
pub fn init_with(config: &TelemetryConfig) {
    tracing::init(config);
}
