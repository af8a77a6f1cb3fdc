use crate::config::schema::{ProjectConfig, ValidationError};
use crate::grammar::GrammarRegistry;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "SYNGREP_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Missing {
        path: PathBuf,
        origin: ConfigOrigin,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Yaml {
        path: Option<PathBuf>,
        source: serde_yaml::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Yaml { path: None, source } => ConfigError::Yaml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { path, origin } => {
                write!(f, "config file {} (from {origin}) does not exist", path.display())
            }
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Yaml { path, source } => match path {
                Some(path) => write!(f, "failed to parse config YAML ({}): {}", path.display(), source),
                None => write!(f, "failed to parse config YAML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid config ({}): {}", path.display(), source),
                None => write!(f, "invalid config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Missing { .. } => None,
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Yaml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Where the config path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Flag,
    Env,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Flag => write!(f, "--config"),
            ConfigOrigin::Env => write!(f, "{CONFIG_ENV}"),
        }
    }
}

/// Picks the config path: the flag wins over the environment variable.
pub fn locate(flag: Option<&Path>, env: Option<OsString>) -> Option<(PathBuf, ConfigOrigin)> {
    if let Some(path) = flag {
        return Some((path.to_path_buf(), ConfigOrigin::Flag));
    }
    env.filter(|value| !value.is_empty())
        .map(|value| (PathBuf::from(value), ConfigOrigin::Env))
}

pub fn load_from_str(input: &str, registry: &GrammarRegistry) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = if input.trim().is_empty() {
        ProjectConfig::default()
    } else {
        serde_yaml::from_str(input).map_err(|source| ConfigError::Yaml { path: None, source })?
    };
    config
        .validate(registry)
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>, registry: &GrammarRegistry) -> Result<ProjectConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, registry).map_err(|error| error.with_path(path))
}

/// Loads the config named by `--config` or `SYNGREP_CONFIG`, or the default
/// config when neither is set.
pub fn load(flag: Option<&Path>, registry: &GrammarRegistry) -> Result<ProjectConfig, ConfigError> {
    let Some((path, origin)) = locate(flag, std::env::var_os(CONFIG_ENV)) else {
        return Ok(ProjectConfig::default());
    };
    if !path.is_file() {
        return Err(ConfigError::Missing { path, origin });
    }
    debug!(path = %path.display(), %origin, "loading config");
    load_from_path(&path, registry)
}
