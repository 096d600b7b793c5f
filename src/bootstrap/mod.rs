//! Process startup: configuration first, then the logger built from it.

use crate::config::{ConfigError, ConfigStore, EnvSource, ProcessEnv, StartupArgs};
use crate::logging::{self, LogError, Logger, LoggerLayer};
use std::io::{self, Write};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, registry};

/// Startup failure; the entry point treats every variant as fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid arguments: {0}")]
    Args(#[from] clap::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("logging initialization failed: {0}")]
    Logging(#[from] LogError),
}

/// Everything a service needs after startup.
#[derive(Debug)]
pub struct Service {
    pub config: ConfigStore,
    pub logger: Logger,
}

/// Load `.env`, read arguments and environment, and initialize on stdout.
pub fn initialize() -> Result<Service, StartupError> {
    load_dotenv()?;
    let args = StartupArgs::from_env(&ProcessEnv)?;
    initialize_with(&args, ConfigStore::new(), io::stdout())
}

/// Initialize `config` from `args`, build its logger on `writer` and make it the
/// process default. Any state already in `config` is discarded first.
pub fn initialize_with(
    args: &StartupArgs,
    mut config: ConfigStore,
    writer: impl Write + Send + 'static,
) -> Result<Service, StartupError> {
    config.initialize(args)?;
    let logger = logging::initialize_with_output(&config, writer)?;
    Ok(Service { config, logger })
}

/// Same as [`initialize_with`] with an explicit environment source.
pub fn initialize_with_env(
    args: &StartupArgs,
    env: impl EnvSource + 'static,
    writer: impl Write + Send + 'static,
) -> Result<Service, StartupError> {
    initialize_with(args, ConfigStore::with_env(env), writer)
}

/// A missing `.env` file is fine; an unreadable or malformed one is not.
fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::DotEnv(e)),
    }
}

/// Route `tracing` events through the process default logger, whichever one it
/// is when the event fires. Only the first call in a process installs anything;
/// returns whether this one did.
pub fn install_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

    registry()
        .with(filter)
        .with(LoggerLayer::default_logger())
        .try_init()
        .is_ok()
}
