//! Loading of `.sdt.toml`.
//!
//! The project directory is searched first, then `$HOME`. A file that fails
//! to read or parse is reported and the built-in defaults are used instead.
//!
//! ```toml
//! description = "Team parsers"
//! glob = "*.py"
//! timeout_secs = 30
//!
//! [commands.python]
//! executable = "python3.12"
//! switches = ["-m", "ast", "-a"]
//!
//! [commands.json]
//! executable = "BUILT-IN"
//! switches = []
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use sdt_lang_api::Config;

/// File name looked up in the project and home directories.
pub const CONFIG_FILE: &str = ".sdt.toml";

/// Description reported when the configuration does not set one.
pub const DEFAULT_DESCRIPTION: &str = "Default commands for each language type";

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `./.sdt.toml`.
    Project(PathBuf),
    /// `$HOME/.sdt.toml`.
    Home(PathBuf),
    /// No usable file; built-in defaults.
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(path) => write!(f, "project configuration {}", path.display()),
            Self::Home(path) => write!(f, "home configuration {}", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Configuration plus its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

impl LoadedConfig {
    pub fn description(&self) -> &str {
        self.config
            .description
            .as_deref()
            .filter(|text| !text.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION)
    }
}

/// Load the first `.sdt.toml` found in `project`, then `home`.
pub fn load(project: &Path, home: Option<&Path>) -> LoadedConfig {
    let project_file = project.join(CONFIG_FILE);
    if project_file.is_file() {
        if let Some(config) = read(&project_file) {
            return LoadedConfig {
                config,
                source: ConfigSource::Project(project_file),
            };
        }
    } else if let Some(home_file) = home.map(|dir| dir.join(CONFIG_FILE)) {
        if home_file.is_file() {
            if let Some(config) = read(&home_file) {
                return LoadedConfig {
                    config,
                    source: ConfigSource::Home(home_file),
                };
            }
        }
    }
    LoadedConfig {
        config: Config::default(),
        source: ConfigSource::Defaults,
    }
}

fn read(path: &Path) -> Option<Config> {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}
