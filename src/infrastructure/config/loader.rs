use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::app_config::AppConfig;
use super::args::CliArgs;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    ConfigDirNotFound,
    #[error("DISCORD_TOKEN is not set")]
    MissingToken,
    #[error("DISCORD_TOKEN is not a valid bot token")]
    InvalidToken,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("invalid config file {path}: {source}")]
    TomlDe {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Reads the config file, writing a default one on first run.
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader for the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = AppConfig::default_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
        Ok(Self { config_dir })
    }

    /// Creates a loader rooted at `path`.
    #[must_use]
    pub fn with_dir(path: PathBuf) -> Self {
        Self { config_dir: path }
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads the file config and merges `args` over it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load_with_args(&self, args: CliArgs) -> Result<AppConfig, ConfigError> {
        let mut config = self.load_config(args.config.as_deref())?;
        config.merge_with_args(args);
        Ok(config)
    }

    /// Loads the application configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let config_path = path_override.map_or_else(
            || self.config_dir.join(CONFIG_FILE_NAME),
            Path::to_path_buf,
        );

        if !config_path.exists() {
            info!(path = %config_path.display(), "Config file not found, creating default");
            let default_config = AppConfig::default();
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            Self::save_to_file(&config_path, &default_config)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        let mut config: AppConfig =
            toml::from_str(&content).map_err(|source| ConfigError::TomlDe {
                path: config_path.clone(),
                source,
            })?;
        debug!(path = %config_path.display(), "Loaded config file");

        config.config = Some(config_path);
        Ok(config)
    }

    fn save_to_file<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(data)?;

        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("Invalid path"))?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::tempdir;

    use super::*;
    use crate::infrastructure::config::Environment;

    #[test]
    fn test_load_config_creates_default_if_missing() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_dir(dir.path().join("embedfix"));

        let config = loader.load_config(None).unwrap();
        assert!(config.suppress_embeds);

        let config_file = dir.path().join("embedfix").join(CONFIG_FILE_NAME);
        assert!(config_file.exists());

        let reloaded = loader.load_config(None).unwrap();
        assert_eq!(reloaded.reaction_emoji, config.reaction_emoji);
        assert_eq!(reloaded.dev_channel_id, config.dev_channel_id);
    }

    #[test]
    fn test_load_config_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_dir(dir.path().to_path_buf());
        let config_file = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&config_file, "invalid_toml = [").unwrap();

        let result = loader.load_config(None);
        assert!(matches!(result, Err(ConfigError::TomlDe { .. })));
        let content = fs::read_to_string(&config_file).unwrap();
        assert_eq!(content, "invalid_toml = [");
    }

    #[test]
    fn test_path_override() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("custom.toml");
        fs::write(&custom, "environment = \"dev\"\n").unwrap();

        let loader = ConfigLoader::with_dir(dir.path().join("unused"));
        let config = loader.load_config(Some(&custom)).unwrap();

        assert_eq!(config.environment, Environment::Dev);
        assert_eq!(config.config.as_deref(), Some(custom.as_path()));
        assert!(!dir.path().join("unused").exists());
    }

    #[test]
    fn test_args_override_file() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::with_dir(dir.path().to_path_buf());
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "reaction_emoji = \"👀\"\nsuppress_embeds = true\n",
        )
        .unwrap();

        let args = CliArgs::parse_from(["embedfix", "--suppress-embeds", "false"]);
        let config = loader.load_with_args(args).unwrap();

        assert!(!config.suppress_embeds);
    }
}
