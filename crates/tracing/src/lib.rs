//! Tracing setup for txplain.
//!
//! Builds a [tracing_subscriber] registry out of a stdout layer and an optional daily rolling
//! log file, each with its own [LogFormat] and filter.
//!
//! ```no_run
//! use txplain_tracing::{LayerInfo, LogFormat, Tracer, TxplainTracer};
//!
//! let _guard = TxplainTracer::new()
//!     .with_stdout(LayerInfo::new(LogFormat::Terminal, "info".to_string(), "".to_string(), None))
//!     .init();
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod formatter;
mod layers;

pub use formatter::LogFormat;
pub use layers::{FileInfo, TXPLAIN_LOG_FILE_NAME};
pub use tracing_appender::non_blocking::WorkerGuard as FileWorkerGuard;

// Re-export tracing crates
pub use tracing;
pub use tracing_subscriber;

use layers::Layers;

/// Initializes a tracing subscriber.
pub trait Tracer {
    /// Installs the subscriber globally. Returns the guard of the file writer, if a file layer
    /// was configured.
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>>;
}

/// Configuration of a single layer.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    format: LogFormat,
    default_directive: String,
    filters: String,
    color: Option<String>,
}

impl LayerInfo {
    /// Creates a layer configuration.
    ///
    /// `default_directive` applies when `RUST_LOG` is unset; `filters` is a comma separated
    /// list of extra directives.
    pub fn new(
        format: LogFormat,
        default_directive: String,
        filters: String,
        color: Option<String>,
    ) -> Self {
        Self { format, default_directive, filters, color }
    }
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            default_directive: "info".to_string(),
            filters: "".to_string(),
            color: Some("always".to_string()),
        }
    }
}

/// The txplain tracer: stdout plus an optional log file.
#[derive(Debug, Clone, Default)]
pub struct TxplainTracer {
    stdout: LayerInfo,
    file: Option<(LayerInfo, FileInfo)>,
}

impl TxplainTracer {
    /// A tracer logging `info` and above to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stdout layer.
    pub fn with_stdout(mut self, config: LayerInfo) -> Self {
        self.stdout = config;
        self
    }

    /// Adds a daily rolling file layer.
    pub fn with_file(mut self, config: LayerInfo, file_info: FileInfo) -> Self {
        self.file = Some((config, file_info));
        self
    }
}

impl Tracer for TxplainTracer {
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>> {
        let mut layers = Layers::new();

        layers.stdout(
            self.stdout.format,
            self.stdout.default_directive.parse()?,
            &self.stdout.filters,
            self.stdout.color,
        )?;

        let file_guard = if let Some((config, file_info)) = self.file {
            Some(layers.file(config.format, &config.filters, file_info)?)
        } else {
            None
        };

        // a subscriber may already be installed, e.g. by a test harness
        let _ = tracing_subscriber::registry().with(layers.into_inner()).try_init();
        Ok(file_guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let tracer = || {
            TxplainTracer::new().with_stdout(LayerInfo::new(
                LogFormat::Terminal,
                "debug".to_string(),
                "".to_string(),
                None,
            ))
        };

        assert!(matches!(tracer().init(), Ok(None)));
        assert!(matches!(tracer().init(), Ok(None)));
        tracing::debug!("tracing initialized twice .");
    }
}
