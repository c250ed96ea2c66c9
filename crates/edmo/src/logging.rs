use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Filter directives that replace `--log-level` when set, e.g.
/// `EDMO_LOG=edmo_frame=trace,warn`.
pub const LOG_ENV: &str = "EDMO_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// `level` for the edmo crates; everything else is capped at warn.
///
/// Target directives match by prefix, so `edmo` also covers `edmo_frame` etc.
fn default_directives(level: LogLevel) -> String {
    let others = if level.as_filter() > LevelFilter::WARN {
        LogLevel::Warn
    } else {
        level
    };
    format!("{},edmo={}", others.directive(), level.directive())
}

fn build_filter(level: LogLevel, env: Option<&str>) -> EnvFilter {
    if let Some(directives) = env.map(str::trim).filter(|d| !d.is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(err) => eprintln!("warning: ignoring {LOG_ENV}: {err}"),
        }
    }
    EnvFilter::new(default_directives(level))
}

/// Install the stderr subscriber. Stdout is reserved for events.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level, env.as_deref()))
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
