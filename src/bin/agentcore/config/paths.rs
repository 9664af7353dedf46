use std::path::PathBuf;

use super::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl ConfigPaths {
    pub fn resolve(config_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let logs_dir = default_logs_dir()?;
        if let Some(config_file) = config_override {
            let config_dir = config_file
                .parent()
                .map(PathBuf::from)
                .ok_or_else(|| ConfigError::Invalid {
                    field: "--config",
                    reason: format!("has no parent directory: {}", config_file.display()),
                })?;
            return Ok(Self {
                config_file,
                config_dir,
                logs_dir,
            });
        }
        let config_dir = default_config_dir()?;
        Ok(Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            logs_dir,
        })
    }
}

fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".config").join("agentcore"))
}

fn default_logs_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
    Ok(home.join(".local").join("share").join("agentcore").join("logs"))
}
