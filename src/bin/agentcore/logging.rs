use std::path::{Path, PathBuf};

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, Naming};

use crate::config::{ConfigPaths, LoggingConfig};

const LOG_BASENAME: &str = "agentcore";

/// Rotating file log. `RUST_LOG` wins over the configured level; bare
/// levels keep dependency crates at `warn`.
pub fn init_logging(config: &LoggingConfig, paths: &ConfigPaths) -> anyhow::Result<()> {
    Logger::try_with_env_or_str(log_spec(&config.level))?
        .log_to_file(file_spec(config.path.as_deref(), &paths.logs_dir))
        .format(flexi_logger::detailed_format)
        .rotate(
            Criterion::Size(config.rotate_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.rotate_keep),
        )
        .start()?;
    log::info!("agentcore {} logging at {}", env!("CARGO_PKG_VERSION"), config.level);
    Ok(())
}

fn log_spec(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("warn,agentcore={level}")
    }
}

fn file_spec(path: Option<&str>, logs_dir: &Path) -> FileSpec {
    let Some(path) = path.map(PathBuf::from) else {
        return FileSpec::default().directory(logs_dir).basename(LOG_BASENAME);
    };
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| logs_dir.to_path_buf(), Path::to_path_buf);
    let basename = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(LOG_BASENAME);
    FileSpec::default().directory(directory).basename(basename)
}
