use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Log level selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.as_str()))
    }
}

/// Initialize the tracing subscriber for the CLI.
pub fn init_logging(level: LogLevel) {
    if tracing_subscriber::fmt()
        .with_env_filter(level.env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: Logging system already initialized");
    }
}
