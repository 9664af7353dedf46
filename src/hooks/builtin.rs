//! Hooks every runtime installs: read-before-write, read cache upkeep and
//! failure classification.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::tools::ToolKind;

use super::classify::classify_error;
use super::read_cache::{normalize_path, FileReadCache};
use super::types::{HookContext, PostHookResult, PreHookResult};
use super::{HookRegistry, HookTarget};

/// Called with the normalized path after a successful `Edit` or `Write`.
pub type IndexInvalidation = Arc<dyn Fn(&Path) + Send + Sync>;

pub const READ_BEFORE_WRITE_ERROR: &str =
    "File has not been read yet. Read it first before writing to it.";

const PATH_KEYS: &[&str] = &["file_path", "path", "filePath"];

fn target_path(ctx: &HookContext) -> Option<PathBuf> {
    ctx.str_param(PATH_KEYS)
        .map(|raw| normalize_path(Path::new(raw), &ctx.working_directory))
}

pub fn install_default_hooks(
    registry: &HookRegistry,
    cache: Arc<FileReadCache>,
    on_index_invalidate: Option<IndexInvalidation>,
) {
    for kind in [ToolKind::Edit, ToolKind::Write] {
        let cache = Arc::clone(&cache);
        registry.register_pre_hook(HookTarget::Tool(kind), move |ctx: &HookContext| {
            read_before_write(&cache, ctx)
        });
    }

    {
        let cache = Arc::clone(&cache);
        registry.register_post_hook(ToolKind::Read, move |ctx: &HookContext, result| {
            if result.success {
                if let (Some(path), Some(content)) = (target_path(ctx), result.content.as_deref()) {
                    cache.record_read(&path, content);
                }
            }
            PostHookResult::pass(result)
        });
    }

    for kind in [ToolKind::Edit, ToolKind::Write] {
        let cache = Arc::clone(&cache);
        let on_index_invalidate = on_index_invalidate.clone();
        registry.register_post_hook(HookTarget::Tool(kind), move |ctx: &HookContext, result| {
            if result.success {
                if let Some(path) = target_path(ctx) {
                    refresh_after_write(&cache, &path);
                    if let Some(callback) = &on_index_invalidate {
                        callback(&path);
                    }
                }
            }
            PostHookResult::pass(result)
        });
    }

    registry.register_post_hook(HookTarget::All, |_ctx: &HookContext, mut result| {
        if result.is_failure() && result.error_type.is_none() {
            let (error_type, suggestion) = classify_error(result.error.as_deref().unwrap_or(""));
            result.error_type = Some(error_type);
            if result.suggestion.is_none() {
                result.suggestion = suggestion.map(str::to_string);
            }
        }
        PostHookResult::pass(result)
    });
}

fn read_before_write(cache: &FileReadCache, ctx: &HookContext) -> PreHookResult {
    let Some(path) = target_path(ctx) else {
        return PreHookResult::proceed();
    };
    if !path.exists() || cache.was_recently_read(&path) {
        return PreHookResult::proceed();
    }
    log::debug!("{} on unread file {}", ctx.tool_name, path.display());
    PreHookResult::reject(
        READ_BEFORE_WRITE_ERROR,
        Some(format!(
            "Use the Read tool on {} before calling {} again.",
            path.display(),
            ctx.tool_name
        )),
    )
}

// The model has seen what it just wrote; keep the entry fresh so a
// follow-up edit is not rejected.
fn refresh_after_write(cache: &FileReadCache, path: &Path) {
    match std::fs::read_to_string(path) {
        Ok(content) => cache.record_read(path, content),
        Err(err) => {
            log::debug!("dropping cache entry for {}: {err}", path.display());
            cache.invalidate(path);
        }
    }
}
