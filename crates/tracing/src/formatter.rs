use clap::ValueEnum;
use std::fmt::{self, Display};
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::layers::BoxedLayer;

/// The output format of a logging layer.
#[derive(Debug, Copy, Clone, ValueEnum, Eq, PartialEq)]
pub enum LogFormat {
    /// One JSON object per event. Suited for log aggregation.
    Json,

    /// `key=value` pairs. Suited for grep and log shippers.
    #[value(name = "logfmt")]
    LogFmt,

    /// Human readable output, optionally colored.
    Terminal,
}

impl LogFormat {
    /// Builds a layer in this format, filtered by `filter`. Events are written to `writer`
    /// when given, stdout otherwise.
    ///
    /// `color` is one of `always`, `auto`, or `never`; `None` disables ANSI codes.
    /// `RUST_LOG_STYLE` and `RUST_LOG_TARGET` override color and target display.
    pub fn apply(
        &self,
        filter: EnvFilter,
        color: Option<String>,
        writer: Option<NonBlocking>,
    ) -> BoxedLayer<Registry> {
        let ansi = if let Some(color) = color {
            std::env::var("RUST_LOG_STYLE").map(|val| val != "never").unwrap_or(color != "never")
        } else {
            false
        };
        let target = std::env::var("RUST_LOG_TARGET")
            .map(|val| val != "0")
            .unwrap_or_else(|_| self != &LogFormat::Terminal);

        match (self, writer) {
            (LogFormat::Json, Some(writer)) => tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(target)
                .with_writer(writer)
                .with_filter(filter)
                .boxed(),
            (LogFormat::Json, None) => tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(ansi)
                .with_target(target)
                .with_filter(filter)
                .boxed(),
            (LogFormat::LogFmt, Some(writer)) => {
                tracing_logfmt::builder().layer().with_writer(writer).with_filter(filter).boxed()
            }
            (LogFormat::LogFmt, None) => {
                tracing_logfmt::builder().layer().with_filter(filter).boxed()
            }
            (LogFormat::Terminal, Some(writer)) => tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(target)
                .with_writer(writer)
                .with_filter(filter)
                .boxed(),
            (LogFormat::Terminal, None) => tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_target(target)
                .with_filter(filter)
                .boxed(),
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::LogFmt => write!(f, "logfmt"),
            LogFormat::Terminal => write!(f, "terminal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_value_names() {
        for format in [LogFormat::Json, LogFormat::LogFmt, LogFormat::Terminal] {
            let parsed = LogFormat::from_str(&format.to_string(), true).expect("known format");
            assert_eq!(parsed, format);
        }
    }
}
