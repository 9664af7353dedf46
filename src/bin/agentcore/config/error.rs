use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid agentcore config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config field `{field}` {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("no home directory to place agentcore config and logs under")]
    MissingHome,
}

impl ConfigError {
    pub(super) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
