use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const DEFAULTS: &str = include_str!("../../config/default.toml");

/// Settings for the `appdef` binary itself, not for any application.
#[derive(Debug, Deserialize)]
pub struct ToolConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Parent of application directories when none is given on the command line.
    pub apps_root: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl ToolConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let mut user_str = None;
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "appdef") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                user_str = Some(fs::read_to_string(&config_path)?);
            }
        }

        let mut config = Self::layered(DEFAULTS, user_str.as_deref())?;
        config.expand_home()?;
        Ok(config)
    }

    /// Merge `user` over `defaults` key by key, so a user file only needs the keys it changes.
    fn layered(defaults: &str, user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(defaults)?;
        if let Some(user) = user {
            let overrides: toml::Table = toml::from_str(user)?;
            merge_tables(&mut merged, overrides);
        }
        Ok(toml::Value::Table(merged).try_into()?)
    }

    pub fn apps_root(&self) -> PathBuf {
        PathBuf::from(&self.general.apps_root)
    }

    fn expand_home(&mut self) -> Result<()> {
        if self.general.apps_root.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            self.general.apps_root =
                self.general
                    .apps_root
                    .replacen('~', &home.to_string_lossy(), 1);
        }
        Ok(())
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        if let toml::Value::Table(nested) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, nested);
                continue;
            }
            base.insert(key, toml::Value::Table(nested));
            continue;
        }
        base.insert(key, value);
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
