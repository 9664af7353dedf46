use async_trait::async_trait;

use super::safety::DangerousOperation;
use super::todo::TodoItem;

/// Answer recorded for `AskUser` when nobody can respond.
pub const NO_ANSWER_MARKER: &str = "[no answer: running non-interactively]";

/// The human on the other side of the session.
///
/// Injected into the runtime at construction; the coordinator calls it for
/// `AskUser`, for `TodoWrite` updates and before dangerous shell commands.
#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Asks a free-form or multiple-choice question. `None` means no answer.
    async fn ask_user(&self, question: &str, options: &[String]) -> Option<String>;

    /// Asks whether a dangerous command may run.
    async fn request_permission(&self, operation: &DangerousOperation, command: &str) -> bool;

    /// Receives the latest task list.
    fn todos_updated(&self, todos: &[TodoItem]);
}

/// Unattended mode: no answers, every permission granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

#[async_trait]
impl UserInteraction for NonInteractive {
    async fn ask_user(&self, question: &str, _options: &[String]) -> Option<String> {
        log::debug!("non-interactive: leaving question unanswered: {question}");
        None
    }

    async fn request_permission(&self, operation: &DangerousOperation, command: &str) -> bool {
        log::warn!(
            "non-interactive: allowing {} without confirmation: {command}",
            operation.describe()
        );
        true
    }

    fn todos_updated(&self, todos: &[TodoItem]) {
        log::debug!("non-interactive: {} todos", todos.len());
    }
}
