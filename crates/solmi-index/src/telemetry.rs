//! Tracing initialisation for processes hosting the indexer.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "solmi_index=info,solmi_db=info";

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `"json"` selects JSON; anything else is text.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Log file path. Enables daily-rotated file output instead of stdout.
    pub file: Option<PathBuf>,
    /// Force ANSI colors on or off. Auto-detected when unset (off for files).
    pub ansi: Option<bool>,
}

impl LogConfig {
    /// Read `LOG_FORMAT`, `LOG_FILE` and `LOG_ANSI`.
    pub fn from_env() -> Self {
        Self {
            format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            file: std::env::var("LOG_FILE").ok().map(PathBuf::from),
            ansi: std::env::var("LOG_ANSI")
                .ok()
                .map(|v| v == "true" || v == "1"),
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

fn split_log_path(path: &Path) -> (&Path, &str) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("solmi-index.log");
    (dir, file_name)
}

/// Install the global tracing subscriber.
///
/// The returned guard flushes file output on drop; keep it alive for the
/// lifetime of the process. Fails if a global subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(path) = &config.file {
        let (dir, file_name) = split_log_path(path);
        let file_appender = tracing_appender::rolling::daily(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        match config.format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .try_init()?,
            LogFormat::Text => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(config.ansi.unwrap_or(false)),
                )
                .try_init()?,
        }
        Some(guard)
    } else {
        match config.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?,
            LogFormat::Text => {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = config.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).try_init()?
            }
        }
        None
    };

    tracing::info!(
        log_format = ?config.format,
        log_file = config
            .file
            .as_deref()
            .and_then(Path::to_str)
            .unwrap_or("(stdout)"),
        "Logging initialized"
    );
    Ok(guard)
}
