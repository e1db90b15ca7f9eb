//! Tracing and logging setup shared by the binaries.

/// Initialize process-wide tracing, JSON unless `LOG_FORMAT=pretty`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::LogFormat;

#[cfg(test)]
mod tests {
    #[test]
    fn init_reads_format_from_env_and_is_idempotent() {
        super::init();
        super::init();
        ::tracing::debug!("initialized twice");
    }
}
