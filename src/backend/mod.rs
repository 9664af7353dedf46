//! Chat backend implementations.

mod http;

pub use http::{HttpBackend, HttpBackendConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
