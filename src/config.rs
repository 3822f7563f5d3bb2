use anyhow::{Context, Result};
use condakit::Settings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

// ============================================================================
// Config file
// ============================================================================

/// Contents of `config.toml`
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Defaults applied when a flag is not given
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Environment name or path
    pub environment: Option<String>,
    /// Path of the conda executable (`~` and `$VARS` are expanded)
    pub executable: Option<String>,
    /// Extra channels
    #[serde(default)]
    pub channels: Vec<String>,
}

impl Config {
    /// Load the config file from the config directory, if there is one
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load a config file; a missing file yields the empty config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config TOML
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build settings, letting command-line values win over the config file
    pub fn settings(
        &self,
        environment: Option<&str>,
        executable: Option<&Path>,
        channels: &[String],
        dry_run: bool,
    ) -> Settings {
        let defaults = &self.defaults;
        let mut settings = Settings::default().with_dry_run(dry_run);

        if let Some(env) = environment.or(defaults.environment.as_deref()) {
            settings.environment = env.to_string();
        }

        settings.executable = executable.map(Path::to_path_buf).or_else(|| {
            defaults
                .executable
                .as_deref()
                .map(|p| paths::expand_path(&PathBuf::from(p)))
        });

        settings.channels = if channels.is_empty() {
            defaults.channels.clone()
        } else {
            channels.to_vec()
        };

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[defaults]
environment = "science"
executable = "/opt/miniforge/bin/conda"
channels = ["conda-forge"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.defaults.environment.as_deref(), Some("science"));
        assert_eq!(config.defaults.channels, vec!["conda-forge"]);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(Config::parse("[defaults]\nenviron = \"x\"\n").is_err());
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "defaults = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_settings_builtin_defaults() {
        let settings = Config::default().settings(None, None, &[], false);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config::parse(SAMPLE).unwrap();
        let settings = config.settings(None, None, &[], true);
        assert_eq!(settings.environment, "science");
        assert_eq!(
            settings.executable,
            Some(PathBuf::from("/opt/miniforge/bin/conda"))
        );
        assert_eq!(settings.channels, vec!["conda-forge"]);
        assert!(settings.dry_run);
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config::parse(SAMPLE).unwrap();
        let channels = vec!["bioconda".to_string()];
        let settings = config.settings(
            Some("./venv"),
            Some(Path::new("/mypath/conda")),
            &channels,
            false,
        );
        assert_eq!(settings.environment, "./venv");
        assert_eq!(settings.executable, Some(PathBuf::from("/mypath/conda")));
        assert_eq!(settings.channels, vec!["bioconda"]);
    }
}
