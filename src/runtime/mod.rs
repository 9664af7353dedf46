//! Runtime wiring: one [`AgentRuntime`] owns the hook registry, the file
//! read cache and the correction log, and hands out conversations.

mod config;
mod conversation;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::chat::ChatBackend;
use crate::coordinator::{CoordinatorConfig, ToolCoordinator};
use crate::hooks::{install_default_hooks, CorrectionLog, FileReadCache, HookRegistry, IndexInvalidation};
use crate::tools::{NonInteractive, ToolBackend, UserInteraction};

pub use config::{RuntimeConfig, DEFAULT_MAX_TOOL_LOOPS};
pub use conversation::{Conversation, TurnOutcome, TurnState};

pub struct AgentRuntime {
    config: RuntimeConfig,
    chat: Arc<dyn ChatBackend>,
    tools: Arc<dyn ToolBackend>,
    interaction: Arc<dyn UserInteraction>,
    hooks: Arc<HookRegistry>,
    read_cache: Arc<FileReadCache>,
    corrections: Arc<CorrectionLog>,
}

impl AgentRuntime {
    pub fn builder(chat: Arc<dyn ChatBackend>, tools: Arc<dyn ToolBackend>) -> AgentRuntimeBuilder {
        AgentRuntimeBuilder {
            chat,
            tools,
            interaction: None,
            config: RuntimeConfig::default(),
            on_index_invalidate: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Register additional hooks here; the defaults are already installed.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn read_cache(&self) -> &FileReadCache {
        &self.read_cache
    }

    pub fn corrections(&self) -> &CorrectionLog {
        &self.corrections
    }

    /// A coordinator bound to this runtime's hooks and collaborators.
    pub fn coordinator(&self, conversation_id: Option<String>, cancel: CancellationToken) -> ToolCoordinator {
        let config = CoordinatorConfig {
            max_parallel: self.config.max_parallel,
            working_directory: self.config.working_directory.clone(),
            skip_permissions: self.config.skip_permissions,
            conversation_id,
        };
        ToolCoordinator::new(
            Arc::clone(&self.tools),
            Arc::clone(&self.hooks),
            Arc::clone(&self.interaction),
            Arc::clone(&self.corrections),
            config,
        )
        .with_cancellation(cancel)
    }

    /// Starts a new, empty conversation.
    pub fn conversation(&self) -> Conversation {
        let id = uuid::Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let coordinator = self.coordinator(Some(id.clone()), cancel.clone());
        Conversation::new(
            id,
            Arc::clone(&self.chat),
            coordinator,
            self.config.system_prompt.clone(),
            self.config.max_tool_loops,
            cancel,
        )
    }
}

pub struct AgentRuntimeBuilder {
    chat: Arc<dyn ChatBackend>,
    tools: Arc<dyn ToolBackend>,
    interaction: Option<Arc<dyn UserInteraction>>,
    config: RuntimeConfig,
    on_index_invalidate: Option<IndexInvalidation>,
}

impl AgentRuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to [`NonInteractive`].
    pub fn interaction(mut self, interaction: Arc<dyn UserInteraction>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    /// Called after every successful `Edit`/`Write` with the written path.
    pub fn on_index_invalidate<F>(mut self, callback: F) -> Self
    where
        F: Fn(&std::path::Path) + Send + Sync + 'static,
    {
        self.on_index_invalidate = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> AgentRuntime {
        let hooks = Arc::new(HookRegistry::new());
        let read_cache = Arc::new(FileReadCache::new(self.config.read_cache_ttl));
        let corrections = Arc::new(CorrectionLog::new(self.config.correction_capacity));
        install_default_hooks(&hooks, Arc::clone(&read_cache), self.on_index_invalidate);
        log::debug!(
            "runtime ready: {} pre-hooks, {} post-hooks, cwd {}",
            hooks.pre_hook_count(),
            hooks.post_hook_count(),
            self.config.working_directory.display()
        );

        AgentRuntime {
            interaction: self
                .interaction
                .unwrap_or_else(|| Arc::new(NonInteractive)),
            config: self.config,
            chat: self.chat,
            tools: self.tools,
            hooks,
            read_cache,
            corrections,
        }
    }
}
