//! Logging utilities
//!
//! Provides logging configuration and helpers.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// `--verbose` wins over the configured level
    pub fn resolve(verbose: bool, configured: &str) -> Self {
        if verbose {
            LogLevel::Debug
        } else {
            Self::from_str(configured).unwrap_or(LogLevel::Info)
        }
    }
}

/// Initialize the logger with specified level
///
/// Logs go to stderr so machine-readable reports on stdout stay clean.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::new(format!("runtime_tester={}", level.to_tracing_level()));

    // A subscriber may already be installed (tests, embedding binaries)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("unknown"), None);
    }

    #[test]
    fn test_resolve_prefers_verbose() {
        assert_eq!(LogLevel::resolve(true, "error"), LogLevel::Debug);
        assert_eq!(LogLevel::resolve(false, "warn"), LogLevel::Warn);
        assert_eq!(LogLevel::resolve(false, "bogus"), LogLevel::Info);
    }

    #[test]
    fn test_init_logger_twice_does_not_panic() {
        init_logger(LogLevel::Info);
        init_logger(LogLevel::Debug);
    }
}
