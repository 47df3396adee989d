//! Tracing, logging, metrics (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// In-process outcome counters.
pub mod metrics;

pub use self::metrics::OutcomeCounters;
pub use self::tracing::LogFormat;
