//! Layered configuration loading with figment.
//!
//! Sources, lowest priority first:
//!
//! ```text
//! defaults ─▶ merge() ─▶ bottex.<profile>.toml ─▶ bottex.toml ─▶ BOTTEX_* ─▶ set()
//! ```
//!
//! Files are looked up in each search path (the current directory and
//! `<config dir>/bottex` unless paths are given). The first directory holding
//! a main file wins; its profile variant, if any, is merged just below it.
//! TOML needs the `toml-config` feature and YAML the `yaml-config` feature.
//!
//! Environment variables use the `BOTTEX_` prefix and `__` as the separator:
//!
//! - `BOTTEX_LOGGING__LEVEL=debug` → `logging.level`
//! - `BOTTEX_STORAGE__BACKEND=sqlite` → `storage.backend`
//! - `BOTTEX_RECEIVERS__TELEGRAM__TOKEN=xxx` → `receivers.telegram.token`
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/bottex.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::BottexConfig;

const ENV_PREFIX: &str = "BOTTEX_";
const PROFILE_VAR: &str = "BOTTEX_PROFILE";

// =============================================================================
// Profile
// =============================================================================

/// Selects the `bottex.<profile>.*` file merged below the main file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `dev` and `prod` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            _ => Self::Custom(name.to_string()),
        }
    }

    /// Reads `BOTTEX_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// File formats
// =============================================================================

/// A configuration file format enabled at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    #[cfg(feature = "toml-config")]
    Toml,
    #[cfg(feature = "yaml-config")]
    Yaml,
}

impl FileFormat {
    /// Main file names searched for, in order.
    fn candidates() -> Vec<(&'static str, FileFormat)> {
        #[allow(unused_mut)]
        let mut names = Vec::new();
        #[cfg(feature = "toml-config")]
        names.extend([("bottex.toml", Self::Toml), ("config.toml", Self::Toml)]);
        #[cfg(feature = "yaml-config")]
        names.extend([
            ("bottex.yaml", Self::Yaml),
            ("bottex.yml", Self::Yaml),
            ("config.yaml", Self::Yaml),
            ("config.yml", Self::Yaml),
        ]);
        names
    }

    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            #[cfg(feature = "toml-config")]
            "toml" => Some(Self::Toml),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    #[allow(unused_variables)]
    fn merge(self, figment: Figment, path: &Path) -> Figment {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => figment.merge(Toml::file(path)),
            #[cfg(feature = "yaml-config")]
            Self::Yaml => figment.merge(Yaml::file(path)),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Builds a [`BottexConfig`] from defaults, files, environment and code.
pub struct ConfigLoader {
    base: Figment,
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with the profile from `BOTTEX_PROFILE` and
    /// environment variables enabled.
    pub fn new() -> Self {
        Self {
            base: Figment::new(),
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a directory to search for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<config dir>/bottex` (e.g. `~/.config/bottex`).
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join("bottex")),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching. A missing file is an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a base configuration that files and environment can override.
    pub fn merge(mut self, config: BottexConfig) -> Self {
        self.base = self.base.merge(Serialized::defaults(config));
        self
    }

    /// Sets a single value at a dotted key path, above every other source.
    ///
    /// ```rust,ignore
    /// ConfigLoader::new().set("storage.backend", "sqlite")
    /// ```
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<BottexConfig> {
        let profile = self.profile.clone();
        let config: BottexConfig = self.figment()?.extract()?;
        config.validate()?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            receivers = config.receivers.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(self) -> ConfigResult<Figment> {
        let files = match &self.config_file {
            Some(path) => vec![Self::explicit_file(path)?],
            None => {
                let found = self.discover();
                if found.is_empty() {
                    warn!("No configuration file found, using defaults");
                }
                found
            }
        };

        let mut figment =
            Figment::from(Serialized::defaults(BottexConfig::default())).merge(self.base);
        for (path, format) in files {
            info!(path = %path.display(), "Loading configuration file");
            figment = format.merge(figment, &path);
        }
        if self.load_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["PROFILE"]).split("__"));
        }
        Ok(figment.merge(self.overrides))
    }

    fn explicit_file(path: &Path) -> ConfigResult<(PathBuf, FileFormat)> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let format = FileFormat::from_path(path).ok_or_else(|| {
            ConfigError::ParseError(format!(
                "unsupported or disabled configuration file format: {}",
                path.display()
            ))
        })?;
        Ok((path.to_path_buf(), format))
    }

    /// Files to merge, lowest priority first: the profile variant and the main
    /// file of the first directory that has a main file.
    fn discover(&self) -> Vec<(PathBuf, FileFormat)> {
        let dirs = if self.search_paths.is_empty() {
            Self::default().with_current_dir().with_user_config_dir().search_paths
        } else {
            self.search_paths.clone()
        };

        for dir in &dirs {
            for (name, format) in FileFormat::candidates() {
                let main = dir.join(name);
                if !main.exists() {
                    continue;
                }
                let mut files = Vec::with_capacity(2);
                if let Some((stem, ext)) = name.rsplit_once('.') {
                    let variant = dir.join(format!("{stem}.{}.{ext}", self.profile));
                    if variant.exists() {
                        files.push((variant, format));
                    }
                }
                files.push((main, format));
                return files;
            }
        }
        Vec::new()
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<BottexConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, plus environment variables.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<BottexConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogLevel, StorageBackend};

    #[test]
    fn test_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .without_env()
            .search_path(dir.path())
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here/bottex.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .without_env()
            .search_path(dir.path())
            .set("storage.backend", "sqlite")
            .set("logging.level", "debug")
            .load()
            .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_main_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bottex.staging.toml"),
            "[logging]\nlevel = \"trace\"\n\n[storage]\nbackend = \"sqlite\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("bottex.toml"),
            "[logging]\nlevel = \"warn\"\n\n[receivers.telegram]\ntoken = \"abc\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .profile("staging")
            .search_path(dir.path())
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.receivers.contains_key("telegram"));
    }
}
