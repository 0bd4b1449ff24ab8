//! Logging utilities and configuration for meta-guard.
//!
//! Classification runs can touch millions of candidates, so per-candidate and
//! per-pruning logging is opt-in through [`LogConfig`] and the
//! [`log_classifier!`](crate::log_classifier) / [`log_pruning!`](crate::log_pruning)
//! macros.

use tracing::Level;

/// Logging configuration for meta-guard components.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for meta-guard components
    pub base_level: Level,
    /// Whether to log every classifier verdict
    pub log_classifier_details: bool,
    /// Whether to log every pruned inclusion dependency
    pub log_pruning_details: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_classifier_details: false,
            log_pruning_details: false,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_classifier_details: true,
            log_pruning_details: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production with lowest overhead.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_classifier_details: false,
            log_pruning_details: false,
            max_field_length: 128,
        }
    }
}

/// Macro for conditional per-verdict classifier logging.
#[macro_export]
macro_rules! log_classifier {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_classifier_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional logging of pruned inclusion dependencies.
#[macro_export]
macro_rules! log_pruning {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_pruning_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to the maximum field length if needed.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Utilities for installing a `tracing` subscriber.
pub mod setup {
    use tracing::Level;

    /// Configuration for meta-guard's logging setup.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for meta-guard components specifically
        pub crate_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Uses the base level of a component [`LogConfig`](super::LogConfig)
        /// for meta-guard's own events.
        pub fn for_components(config: &super::LogConfig) -> Self {
            Self::default().with_crate_level(config.base_level)
        }

        /// Sets the log level for the application.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for meta-guard components.
        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},meta_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use meta_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
