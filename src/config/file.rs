use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Conventional configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "fpgabox.json";

/// Configuration file contents (fpgabox.json).
///
/// Every field is optional; absent fields leave the lower-priority layers
/// untouched. List fields accumulate with the command-line lists rather than
/// replacing them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub image: Option<String>,
    pub workspace: Option<String>,
    pub home_path: Option<String>,
    pub user_group: Option<String>,
    pub xilinx_vivado_path: Option<String>,
    pub xilinx_ise_path: Option<String>,
    pub with_usb: Option<bool>,
    pub with_x: Option<bool>,
    pub no_stdin: Option<bool>,
    pub no_tty: Option<bool>,
    pub verbose: Option<bool>,
    pub docker_options: Vec<String>,
    pub python_modules: Vec<String>,
    pub mountpoints: Vec<String>,
    pub copy_env_var: Vec<String>,
    pub add_env_var: Vec<String>,
    pub environment: BTreeMap<String, String>,
}

/// Configuration-time errors. All of these abort before any container starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("environment variable `{0}` is not set in the calling environment")]
    MissingEnvVar(String),

    #[error("malformed environment entry `{0}` (expected NAME=VALUE)")]
    MalformedEnvEntry(String),
}

impl ConfigFile {
    /// Load a configuration file from an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Resolve which configuration file applies.
    ///
    /// An explicit `--config` path is read instead of the conventional
    /// `fpgabox.json`; a missing explicit file is an error while a missing
    /// conventional file is not. `--ignore-config` suppresses file reading
    /// entirely.
    pub fn discover(explicit: Option<&Path>, ignore: bool) -> Result<Self, ConfigError> {
        if ignore {
            return Ok(Self::default());
        }
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let conventional = Path::new(CONFIG_FILE_NAME);
        if conventional.exists() {
            Self::load(conventional)
        } else {
            Ok(Self::default())
        }
    }
}
