use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::Directive, EnvFilter, Layer, Registry};

use crate::formatter::LogFormat;

/// A boxed tracing [Layer].
pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// The log file name used when none is given
pub const TXPLAIN_LOG_FILE_NAME: &str = "txplain.log";

/// Noisy targets silenced unless explicitly enabled
const DEFAULT_ENV_FILTER_DIRECTIVES: [&str; 4] =
    ["hyper=off", "hyper_util=off", "h2=off", "reqwest=off"];

/// Accumulates the layers the subscriber is built from.
pub(crate) struct Layers {
    inner: Vec<BoxedLayer<Registry>>,
}

impl std::fmt::Debug for Layers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layers").field("layers", &self.inner.len()).finish()
    }
}

impl Layers {
    pub(crate) fn new() -> Self {
        Self { inner: vec![] }
    }

    pub(crate) fn into_inner(self) -> Vec<BoxedLayer<Registry>> {
        self.inner
    }

    /// Adds a stdout layer.
    pub(crate) fn stdout(
        &mut self,
        format: LogFormat,
        default_directive: Directive,
        filters: &str,
        color: Option<String>,
    ) -> eyre::Result<()> {
        let filter = build_env_filter(Some(default_directive), filters)?;
        self.inner.push(format.apply(filter, color, None));
        Ok(())
    }

    /// Adds a layer writing to a daily rolling log file. The returned guard flushes the file
    /// on drop and must be held for as long as logs should be written.
    pub(crate) fn file(
        &mut self,
        format: LogFormat,
        filters: &str,
        file_info: FileInfo,
    ) -> eyre::Result<WorkerGuard> {
        std::fs::create_dir_all(&file_info.dir)?;
        let appender = tracing_appender::rolling::daily(&file_info.dir, &file_info.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let filter = build_env_filter(None, filters)?;
        self.inner.push(format.apply(filter, None, Some(writer)));
        Ok(guard)
    }
}

/// Where a file layer writes its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    dir: PathBuf,
    file_name: String,
}

impl FileInfo {
    /// Logs to `dir/txplain.log.<date>`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf(), file_name: TXPLAIN_LOG_FILE_NAME.to_string() }
    }

    /// Overrides the log file name prefix.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// The directory log files are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Builds an [EnvFilter] from `RUST_LOG`, the default directives, and the comma separated
/// `directives`.
pub(crate) fn build_env_filter(
    default_directive: Option<Directive>,
    directives: &str,
) -> eyre::Result<EnvFilter> {
    let env_filter = if let Some(default_directive) = default_directive {
        EnvFilter::builder().with_default_directive(default_directive).from_env_lossy()
    } else {
        EnvFilter::builder().from_env_lossy()
    };

    DEFAULT_ENV_FILTER_DIRECTIVES
        .into_iter()
        .chain(directives.split(',').map(str::trim).filter(|d| !d.is_empty()))
        .try_fold(env_filter, |env_filter, directive| {
            Ok(env_filter.add_directive(directive.parse()?))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_env_filter_accepts_directives() {
        let filter = build_env_filter(None, "txplain_server=debug, tower_http=info");
        assert!(filter.is_ok());
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let logs = dir.path().join("logs");

        let mut layers = Layers::new();
        let guard = layers.file(LogFormat::Json, "info", FileInfo::new(&logs));
        assert!(guard.is_ok());
        assert!(logs.exists());
        assert_eq!(layers.into_inner().len(), 1);
    }

    #[test]
    fn test_file_layer_in_every_format() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");

        let mut layers = Layers::new();
        for format in [LogFormat::Json, LogFormat::LogFmt, LogFormat::Terminal] {
            let logs = dir.path().join(format.to_string());
            let guard = layers.file(format, "debug", FileInfo::new(&logs));
            assert!(guard.is_ok(), "{format} file layer failed");
            assert!(logs.exists());
        }
        assert_eq!(layers.into_inner().len(), 3);
    }
}
