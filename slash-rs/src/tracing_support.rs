//! Logging setup.
//!
//! The framework itself only emits `tracing` events. Applications that do not
//! install their own subscriber can call [`init_logging`] with a
//! [`LogConfig`], usually loaded as part of the client configuration.

use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    #[default]
    Pretty,

    /// Single-line output.
    Compact,

    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directives, e.g. `debug` or `slash=trace,info`.
    ///
    /// If None, uses the RUST_LOG environment variable or defaults to "info".
    pub level: Option<String>,

    /// Output format.
    pub format: LogFormat,

    /// Include timestamps in output.
    pub timestamps: bool,

    /// Include target module names in output.
    pub target: bool,

    /// Include thread IDs in output.
    pub thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: LogFormat::Pretty,
            timestamps: true,
            target: true,
            thread_ids: false,
        }
    }
}

#[cfg(feature = "subscriber")]
pub use subscriber::{init_logging, LogInitError};

#[cfg(feature = "subscriber")]
mod subscriber {
    use super::{LogConfig, LogFormat};
    use thiserror::Error;
    use tracing_subscriber::filter::ParseError;
    use tracing_subscriber::util::TryInitError;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    /// Failure to install the global subscriber
    #[derive(Debug, Error)]
    pub enum LogInitError {
        #[error("Invalid log filter \"{filter}\": {source}")]
        Filter {
            filter: String,
            #[source]
            source: ParseError,
        },

        #[error("A global subscriber is already installed: {0}")]
        AlreadySet(#[from] TryInitError),
    }

    type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

    impl LogConfig {
        /// Filter built from `level`, RUST_LOG, or "info", in that order
        pub fn filter(&self) -> Result<EnvFilter, LogInitError> {
            match &self.level {
                Some(level) => EnvFilter::try_new(level).map_err(|source| LogInitError::Filter {
                    filter: level.clone(),
                    source,
                }),
                None => Ok(EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info"))),
            }
        }

        fn layer(&self) -> BoxedLayer {
            let layer = fmt::layer()
                .with_target(self.target)
                .with_thread_ids(self.thread_ids);

            match (self.format, self.timestamps) {
                (LogFormat::Pretty, true) => layer.pretty().boxed(),
                (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
                (LogFormat::Compact, true) => layer.compact().boxed(),
                (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
                (LogFormat::Json, true) => layer.json().boxed(),
                (LogFormat::Json, false) => layer.json().without_time().boxed(),
            }
        }
    }

    /// Install a global subscriber for `config`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use slash::{init_logging, LogConfig, LogFormat};
    ///
    /// init_logging(&LogConfig {
    ///     format: LogFormat::Json,
    ///     ..Default::default()
    /// })?;
    /// ```
    ///
    /// # Environment Variables
    ///
    /// - `RUST_LOG=debug` - Enable debug logs, including lifecycle transitions
    /// - `RUST_LOG=slash=trace,info` - Per-module filtering
    pub fn init_logging(config: &LogConfig) -> Result<(), LogInitError> {
        let filter = config.filter()?;

        tracing_subscriber::registry()
            .with(config.layer())
            .with(filter)
            .try_init()?;

        Ok(())
    }
}
