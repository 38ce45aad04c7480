use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Per-target filter directives (e.g. `posepipe_pipeline=trace`). When set,
/// they take precedence over `--log-level`.
pub const LOG_FILTER_ENV: &str = "POSEPIPE_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Logs go to stderr; stdout may carry the landmark stream.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let directives = std::env::var(LOG_FILTER_ENV).ok();
    let (filter, rejected) = build_filter(level, directives.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if let Some(directives) = rejected {
        tracing::warn!(%directives, "ignoring invalid {LOG_FILTER_ENV}");
    }
}

/// Returns the filter and, if they failed to parse, the rejected directives.
fn build_filter(level: LogLevel, directives: Option<&str>) -> (EnvFilter, Option<String>) {
    let fallback = || EnvFilter::default().add_directive(LevelFilter::from(level).into());
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => match EnvFilter::try_new(d) {
            Ok(filter) => (filter, None),
            Err(_) => (fallback(), Some(d.to_string())),
        },
        None => (fallback(), None),
    }
}
