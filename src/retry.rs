//! Exponential backoff helpers. Nothing in the runtime retries on its own;
//! callers opt in.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::chat::PendingToolCall;
use crate::coordinator::ToolCoordinator;
use crate::error::AgentError;
use crate::tools::{ErrorType, ToolCallResult};

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 200;
const DEFAULT_MAX_DELAY_MS: u64 = 2_000;

/// Configuration for retry and backoff behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts including the first one
    pub max_attempts: usize,
    /// Initial backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Whether to add random jitter to backoff delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before the attempt following `attempt_index` (0-based).
    pub fn backoff(&self, attempt_index: usize) -> Duration {
        let mut delay = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt_index.min(16))
            .min(self.max_delay_ms);
        if self.jitter && delay > 1 {
            let span = (delay / 2).max(1);
            delay -= rand::thread_rng().gen_range(0..span);
        }
        Duration::from_millis(delay)
    }
}

/// Retries `op` while it fails with a retryable [`AgentError`].
pub async fn retry_with_backoff<F, Fut, T>(cfg: &RetryConfig, mut op: F) -> Result<T, AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    let max_attempts = cfg.max_attempts.max(1);
    let mut last_err: Option<AgentError> = None;

    for attempt in 0..max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if attempt + 1 == max_attempts {
                    last_err = Some(err);
                    break;
                }
                log::debug!("attempt {} failed, retrying: {err}", attempt + 1);
                last_err = Some(err);
                sleep(cfg.backoff(attempt)).await;
            }
        }
    }

    Err(AgentError::RetryExceeded {
        attempts: max_attempts,
        last_error: last_err.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// Runs `call` and re-runs it while its failure is classified transient.
/// Returns the last result either way.
pub async fn retry_tool_call(
    coordinator: &ToolCoordinator,
    call: &PendingToolCall,
    cfg: &RetryConfig,
) -> ToolCallResult {
    let max_attempts = cfg.max_attempts.max(1);
    let mut result = coordinator.execute_call(call).await;
    for attempt in 1..max_attempts {
        if result.result.error_type != Some(ErrorType::Transient) {
            break;
        }
        log::debug!("tool {} failed transiently, attempt {}", call.name, attempt + 1);
        sleep(cfg.backoff(attempt - 1)).await;
        result = coordinator.execute_call(call).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn fast() -> RetryConfig {
        RetryConfig {
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..RetryConfig::default()
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let cfg = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(cfg.backoff(0), Duration::from_millis(200));
        assert_eq!(cfg.backoff(1), Duration::from_millis(400));
        assert_eq!(cfg.backoff(5), Duration::from_millis(2_000));

        let jittered = RetryConfig::default().backoff(1);
        assert!(jittered > Duration::from_millis(200) && jittered <= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicUsize::new(0);
        let value = retry_with_backoff(&fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AgentError::Http("reset".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let calls = AtomicUsize::new(0);
        let err = retry_with_backoff(&fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(AgentError::InvalidRequest("bad".into())) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reports_exhaustion() {
        let err = retry_with_backoff(&fast(), || async {
            Err::<(), _>(AgentError::Provider {
                status: 503,
                body: "busy".into(),
            })
        })
        .await
        .unwrap_err();
        match err {
            AgentError::RetryExceeded { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("busy"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
