//! Pre/post execution hooks around tool dispatch.
//!
//! Pre-hooks run global first, then tool-specific, in registration order; a
//! rejection stops the chain and modified params flow forward. Post-hooks run
//! tool-specific first, then global; a retry request short-circuits.

mod builtin;
mod classify;
mod correction;
mod read_cache;
mod types;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::tools::{ToolKind, ToolResult};

pub use builtin::{install_default_hooks, IndexInvalidation, READ_BEFORE_WRITE_ERROR};
pub use classify::classify_error;
pub use correction::{CorrectionAttempt, CorrectionLog, DEFAULT_CORRECTION_CAPACITY};
pub use read_cache::{normalize_path, FileReadCache, FileReadCacheEntry, DEFAULT_READ_CACHE_TTL};
pub use types::{HookContext, PostHookResult, PreDecision, PreHookResult};

pub type PreHookFn = Arc<dyn Fn(&HookContext) -> PreHookResult + Send + Sync>;
pub type PostHookFn = Arc<dyn Fn(&HookContext, ToolResult) -> PostHookResult + Send + Sync>;

/// Which calls a hook applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookTarget {
    /// The `"*"` wildcard chain.
    All,
    Tool(ToolKind),
}

impl From<&str> for HookTarget {
    fn from(target: &str) -> Self {
        match target.trim() {
            "*" => HookTarget::All,
            name => HookTarget::Tool(ToolKind::from_name(name)),
        }
    }
}

impl From<ToolKind> for HookTarget {
    fn from(kind: ToolKind) -> Self {
        HookTarget::Tool(kind)
    }
}

struct Chains<F> {
    global: Vec<F>,
    by_tool: HashMap<ToolKind, Vec<F>>,
}

impl<F> Default for Chains<F> {
    fn default() -> Self {
        Self {
            global: Vec::new(),
            by_tool: HashMap::new(),
        }
    }
}

impl<F: Clone> Chains<F> {
    fn push(&mut self, target: HookTarget, hook: F) {
        match target {
            HookTarget::All => self.global.push(hook),
            HookTarget::Tool(kind) => self.by_tool.entry(kind).or_default().push(hook),
        }
    }

    fn specific(&self, kind: &ToolKind) -> Vec<F> {
        self.by_tool.get(kind).cloned().unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.global.len() + self.by_tool.values().map(Vec::len).sum::<usize>()
    }
}

/// Ordered hook chains keyed by canonical tool kind, plus a global chain.
#[derive(Default)]
pub struct HookRegistry {
    pre: RwLock<Chains<PreHookFn>>,
    post: RwLock<Chains<PostHookFn>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pre_hook<F>(&self, target: impl Into<HookTarget>, hook: F)
    where
        F: Fn(&HookContext) -> PreHookResult + Send + Sync + 'static,
    {
        self.pre.write().push(target.into(), Arc::new(hook));
    }

    pub fn register_post_hook<F>(&self, target: impl Into<HookTarget>, hook: F)
    where
        F: Fn(&HookContext, ToolResult) -> PostHookResult + Send + Sync + 'static,
    {
        self.post.write().push(target.into(), Arc::new(hook));
    }

    pub fn pre_hook_count(&self) -> usize {
        self.pre.read().len()
    }

    pub fn post_hook_count(&self) -> usize {
        self.post.read().len()
    }

    /// Runs the pre chain and returns the params to dispatch with, or the
    /// first rejection.
    pub fn run_pre(&self, ctx: &HookContext) -> PreDecision {
        // Snapshot so hooks may register further hooks without deadlocking.
        let chain: Vec<PreHookFn> = {
            let chains = self.pre.read();
            let mut chain = chains.global.clone();
            chain.extend(chains.specific(&ctx.kind));
            chain
        };

        let mut current = ctx.clone();
        for hook in chain {
            let verdict = hook(&current);
            if !verdict.proceed {
                let error = verdict
                    .error
                    .unwrap_or_else(|| format!("{} blocked by pre-execution hook", ctx.tool_name));
                log::debug!("pre-hook rejected {}: {error}", ctx.tool_name);
                return PreDecision::Reject {
                    error,
                    suggestion: verdict.suggestion,
                };
            }
            if let Some(params) = verdict.modified_params {
                current.params = params;
            }
        }
        PreDecision::Proceed(current.params)
    }

    /// Runs the post chain over `result`.
    pub fn run_post(&self, ctx: &HookContext, result: ToolResult) -> PostHookResult {
        let chain: Vec<PostHookFn> = {
            let chains = self.post.read();
            let mut chain = chains.specific(&ctx.kind);
            chain.extend(chains.global.iter().cloned());
            chain
        };

        let mut outcome = PostHookResult::pass(result);
        for hook in chain {
            let follow_up = outcome.follow_up_action.take();
            let next = hook(ctx, outcome.result);
            if next.should_retry {
                log::debug!("post-hook requested retry of {}", ctx.tool_name);
                return next;
            }
            outcome = PostHookResult {
                follow_up_action: next.follow_up_action.or(follow_up),
                ..next
            };
        }
        outcome
    }
}
