use std::path::PathBuf;
use std::time::Duration;

use crate::coordinator::DEFAULT_MAX_PARALLEL;
use crate::hooks::{DEFAULT_CORRECTION_CAPACITY, DEFAULT_READ_CACHE_TTL};

pub const DEFAULT_MAX_TOOL_LOOPS: usize = 25;

/// Settings shared by every conversation of an [`AgentRuntime`](super::AgentRuntime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// How long a read satisfies the read-before-write gate
    pub read_cache_ttl: Duration,
    /// Number of correction attempts kept
    pub correction_capacity: usize,
    /// Concurrent parallel-safe tool calls
    pub max_parallel: usize,
    /// Tool batches allowed per user turn
    pub max_tool_loops: usize,
    /// Directory relative tool paths resolve against
    pub working_directory: PathBuf,
    /// Run dangerous shell commands without asking
    pub skip_permissions: bool,
    pub system_prompt: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            read_cache_ttl: DEFAULT_READ_CACHE_TTL,
            correction_capacity: DEFAULT_CORRECTION_CAPACITY,
            max_parallel: DEFAULT_MAX_PARALLEL,
            max_tool_loops: DEFAULT_MAX_TOOL_LOOPS,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            skip_permissions: false,
            system_prompt: None,
        }
    }
}
