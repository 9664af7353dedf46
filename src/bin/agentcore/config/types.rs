use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use agentcore::backend::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use agentcore::coordinator::DEFAULT_MAX_PARALLEL;
use agentcore::hooks::DEFAULT_READ_CACHE_TTL;
use agentcore::runtime::DEFAULT_MAX_TOOL_LOOPS;

pub const DEFAULT_LOG_ROTATE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_LOG_ROTATE_KEEP: usize = 5;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub max_tokens: u32,
    pub system: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub max_parallel: usize,
    pub read_cache_ttl_secs: u64,
    pub max_tool_loops: usize,
    pub skip_permissions: bool,
    pub working_dir: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            read_cache_ttl_secs: DEFAULT_READ_CACHE_TTL.as_secs(),
            max_tool_loops: DEFAULT_MAX_TOOL_LOOPS,
            skip_permissions: false,
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub path: Option<String>,
    pub rotate_size: u64,
    pub rotate_keep: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
            rotate_size: DEFAULT_LOG_ROTATE_SIZE,
            rotate_keep: DEFAULT_LOG_ROTATE_KEEP,
        }
    }
}
