pub mod file;
pub mod settings;

pub use file::{ConfigError, ConfigFile, CONFIG_FILE_NAME};
pub use settings::{CliOverlay, Settings};
