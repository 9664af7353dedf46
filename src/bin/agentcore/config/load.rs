use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::paths::ConfigPaths;
use super::types::AppConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub paths: ConfigPaths,
    pub config_exists: bool,
}

pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let paths = ConfigPaths::resolve(path_override)?;
    fs::create_dir_all(&paths.config_dir).map_err(ConfigError::io(&paths.config_dir))?;
    fs::create_dir_all(&paths.logs_dir).map_err(ConfigError::io(&paths.logs_dir))?;
    let (config, config_exists) = read_config(&paths.config_file)?;
    validate(&config)?;
    secure_file_permissions(&paths.config_file)?;
    Ok(LoadedConfig {
        config,
        paths,
        config_exists,
    })
}

/// A missing file yields the defaults.
pub(super) fn read_config(path: &Path) -> Result<(AppConfig, bool), ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok((toml::from_str(&contents)?, true)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok((AppConfig::default(), false)),
        Err(err) => Err(ConfigError::io(path)(err)),
    }
}

/// Rejects values the runtime cannot run with.
pub(super) fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let zero = |field| {
        Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        })
    };
    if config.tools.max_parallel == 0 {
        return zero("tools.max_parallel");
    }
    if config.tools.max_tool_loops == 0 {
        return zero("tools.max_tool_loops");
    }
    if config.backend.max_tokens == 0 {
        return zero("backend.max_tokens");
    }
    if config.backend.api_key_env.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "backend.api_key_env",
            reason: "must name an environment variable".to_string(),
        });
    }
    Ok(())
}

// Clears group and other bits.
fn secure_file_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let mut perms = metadata.permissions();
            if perms.mode() & 0o077 != 0 {
                perms.set_mode(0o600);
                fs::set_permissions(path, perms).map_err(ConfigError::io(path))?;
            }
        }
    }
    Ok(())
}
