//! Tool execution coordinator.
//!
//! A batch is split by [`ExecutionClass`]: parallel-safe calls run
//! concurrently under a semaphore, then sequential calls run one at a time in
//! request order. Results always come back in request order.

mod internal;

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::chat::{PendingToolCall, ToolSchema};
use crate::hooks::{CorrectionLog, HookContext, HookRegistry, PreDecision};
use crate::tools::{
    classify_command, ErrorType, ExecutionClass, RetryRequest, ToolBackend, ToolCallResult,
    ToolError, ToolKind, ToolResult, UserInteraction,
};

pub const DEFAULT_MAX_PARALLEL: usize = 8;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound on concurrently running parallel-safe calls.
    pub max_parallel: usize,
    pub working_directory: PathBuf,
    /// Run dangerous shell commands without asking.
    pub skip_permissions: bool,
    pub conversation_id: Option<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            skip_permissions: false,
            conversation_id: None,
        }
    }
}

/// Executes batches of pending tool calls through the hook pipeline.
#[derive(Clone)]
pub struct ToolCoordinator {
    backend: Arc<dyn ToolBackend>,
    hooks: Arc<HookRegistry>,
    interaction: Arc<dyn UserInteraction>,
    corrections: Arc<CorrectionLog>,
    config: CoordinatorConfig,
    cancel: CancellationToken,
}

impl ToolCoordinator {
    pub fn new(
        backend: Arc<dyn ToolBackend>,
        hooks: Arc<HookRegistry>,
        interaction: Arc<dyn UserInteraction>,
        corrections: Arc<CorrectionLog>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            backend,
            hooks,
            interaction,
            corrections,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Calls not yet started when `cancel` fires come back cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Schemas to advertise: the backend's tools plus `TodoWrite` and
    /// `AskUser`, unless the backend already provides them.
    pub fn definitions(&self) -> Vec<ToolSchema> {
        let mut schemas = self.backend.definitions();
        for schema in internal::definitions() {
            let kind = ToolKind::from_name(&schema.name);
            if !schemas.iter().any(|s| ToolKind::from_name(&s.name) == kind) {
                schemas.push(schema);
            }
        }
        schemas
    }

    /// Runs every call of `calls` and returns one result per call, in order.
    /// Individual failures never abort the batch.
    pub async fn execute_batch(&self, calls: &[PendingToolCall]) -> Vec<ToolCallResult> {
        let (parallel, sequential): (Vec<_>, Vec<_>) =
            calls.iter().enumerate().partition(|(_, call)| {
                ToolKind::from_name(&call.name).execution_class() == ExecutionClass::Parallel
            });
        log::debug!(
            "executing batch of {} tool calls ({} parallel, {} sequential)",
            calls.len(),
            parallel.len(),
            sequential.len()
        );

        let mut slots: Vec<Option<ToolCallResult>> = vec![None; calls.len()];

        let semaphore = Semaphore::new(self.config.max_parallel.max(1));
        let running = parallel.into_iter().map(|(index, call)| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await;
                (index, self.execute_call(call).await)
            }
        });
        for (index, result) in join_all(running).await {
            slots[index] = Some(result);
        }

        for (index, call) in sequential {
            slots[index] = Some(self.execute_call(call).await);
        }

        // Re-walk the request so output order never depends on completion order.
        calls
            .iter()
            .zip(slots)
            .map(|(call, slot)| {
                slot.unwrap_or_else(|| ToolCallResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    result: ToolResult::failure("tool call produced no result"),
                    retry: None,
                })
            })
            .collect()
    }

    /// Runs a single call through the full pipeline.
    pub async fn execute_call(&self, call: &PendingToolCall) -> ToolCallResult {
        self.dispatch(call, call.input.clone(), 0).await
    }

    /// Re-runs `call` with corrected parameters and records the attempt in
    /// the correction log.
    pub async fn retry_call(
        &self,
        call: &PendingToolCall,
        corrected_params: Map<String, Value>,
        retry_count: u32,
        error: &str,
    ) -> ToolCallResult {
        let kind = ToolKind::from_name(&call.name);
        self.corrections.record(
            kind.canonical_name(),
            call.input.clone(),
            error,
            corrected_params.clone(),
        );
        self.dispatch(call, corrected_params, retry_count).await
    }

    async fn dispatch(
        &self,
        call: &PendingToolCall,
        params: Map<String, Value>,
        retry_count: u32,
    ) -> ToolCallResult {
        let finish = |result: ToolResult, retry: Option<RetryRequest>| ToolCallResult {
            id: call.id.clone(),
            name: call.name.clone(),
            result,
            retry,
        };

        if self.cancel.is_cancelled() {
            return finish(ToolResult::cancelled("turn cancelled before the tool ran"), None);
        }

        let mut ctx = HookContext::new(&call.name, params, self.config.working_directory.clone())
            .with_conversation(self.config.conversation_id.clone())
            .with_retry_count(retry_count);

        match self.hooks.run_pre(&ctx) {
            PreDecision::Proceed(params) => ctx.params = params,
            PreDecision::Reject { error, suggestion } => {
                let mut result = ToolResult::failure(error);
                result.suggestion = suggestion;
                result.error_type = Some(ErrorType::Recoverable);
                return finish(result, None);
            }
        }

        let result = match ctx.kind {
            ToolKind::TodoWrite => internal::todo_write(self.interaction.as_ref(), &ctx.params),
            ToolKind::AskUser => internal::ask_user(self.interaction.as_ref(), &ctx.params).await,
            ToolKind::Bash => match self.confirm_shell(&ctx.params).await {
                Some(declined) => declined,
                None => self.invoke_backend(&call.name, &ctx.params).await,
            },
            _ => self.invoke_backend(&call.name, &ctx.params).await,
        };

        let outcome = self.hooks.run_post(&ctx, result);
        if let Some(action) = &outcome.follow_up_action {
            log::debug!("follow-up for {}: {action}", call.name);
        }
        let retry = outcome.should_retry.then(|| RetryRequest {
            params: outcome.retry_params.clone(),
        });
        finish(outcome.result, retry)
    }

    /// `Some(result)` when the user declined a dangerous command.
    async fn confirm_shell(&self, params: &Map<String, Value>) -> Option<ToolResult> {
        let command = params.get("command").and_then(Value::as_str)?;
        let operation = classify_command(command)?;
        if self.config.skip_permissions {
            log::warn!("running {} without confirmation: {command}", operation.describe());
            return None;
        }
        if self.interaction.request_permission(&operation, command).await {
            log::info!("user approved {}: {command}", operation.describe());
            None
        } else {
            log::info!("user declined {}: {command}", operation.describe());
            Some(ToolResult::cancelled(format!(
                "user declined {}: {command}",
                operation.describe()
            )))
        }
    }

    async fn invoke_backend(&self, name: &str, params: &Map<String, Value>) -> ToolResult {
        match self.backend.execute(name, params).await {
            Ok(result) => result,
            Err(ToolError::NotFound(_)) => ToolResult::failure(format!("Unknown tool: {name}")),
            Err(err @ (ToolError::Denied(_) | ToolError::Fatal(_))) => {
                log::warn!("tool {name} failed permanently: {err}");
                let mut result = ToolResult::failure(err.to_string());
                result.error_type = Some(ErrorType::Fatal);
                result
            }
            Err(err) => {
                log::debug!("tool {name} failed: {err}");
                ToolResult::failure(err.to_string())
            }
        }
    }
}
