//! Where configuration comes from: process arguments, environment, config file location.

use super::ConfigError;
use clap::Parser;
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Overrides the config location given by `--config`.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";
/// Selects `<environment>-config.yaml` inside a config directory.
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";
/// Comma-separated replacement for the process arguments, used by tests.
pub const FLAG_FOR_MAIN_VAR: &str = "FLAG_FOR_MAIN";

const DEFAULT_ENVIRONMENT: &str = "development";

/// Source of environment variable lookups.
///
/// Empty values are reported as unset.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

/// Command line arguments understood at startup.
#[derive(Debug, Clone, Default, Parser)]
#[command(about = "Identity service")]
pub struct StartupArgs {
    /// Path to configuration directory or file
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl StartupArgs {
    /// Parse the process arguments, or `FLAG_FOR_MAIN` when it is set.
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, clap::Error> {
        Self::parse_with(env::args_os(), env)
    }

    /// Parse `args` (program name first), with `FLAG_FOR_MAIN` replacing
    /// everything after the program name when set.
    pub fn parse_with(
        args: impl IntoIterator<Item = OsString>,
        env: &dyn EnvSource,
    ) -> Result<Self, clap::Error> {
        let mut args = args.into_iter();
        let program = args
            .next()
            .unwrap_or_else(|| OsString::from("identity-service"));

        match env.var(FLAG_FOR_MAIN_VAR) {
            Some(flags) => Self::try_parse_from(
                std::iter::once(program).chain(
                    flags
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(OsString::from),
                ),
            ),
            None => Self::try_parse_from(std::iter::once(program).chain(args)),
        }
    }

    /// Arguments pointing straight at a config path.
    pub fn with_config(path: impl Into<PathBuf>) -> Self {
        Self {
            config: Some(path.into()),
        }
    }
}

/// Resolve the config file to load.
///
/// The `--config` flag wins over `CONFIG_PATH`. A directory resolves to
/// `<dir>/<ENVIRONMENT>-config.yaml`, with `development` as the default environment.
pub fn locate_config_file(args: &StartupArgs, env: &dyn EnvSource) -> Result<PathBuf, ConfigError> {
    let location = args
        .config
        .clone()
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(|| env.var(CONFIG_PATH_VAR).map(PathBuf::from))
        .ok_or(ConfigError::NoLocation)?;

    let file = if location.is_dir() {
        let environment = env
            .var(ENVIRONMENT_VAR)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        location.join(format!("{}-config.yaml", environment))
    } else {
        location
    };

    check_extension(&file)?;
    Ok(file)
}

fn check_extension(path: &Path) -> Result<(), ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Ok(()),
        _ => Err(ConfigError::UnsupportedExtension(path.to_path_buf())),
    }
}

/// Environment variable that overrides `key`: dots become underscores, then uppercase.
pub fn env_key(key: &str) -> String {
    key.replace('.', "_").to_uppercase()
}
