//! Process-wide tracing/logging setup.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide observability with the format from `LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    crate::tracing::init(LogFormat::from_env());
}
