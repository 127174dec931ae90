use std::fs::File;
use std::path::Path;

use search_client::consts::env_var::SEARCH_LOG_LEVEL;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_FILTER: LevelFilter = LevelFilter::ERROR;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Arguments to [`initialize_logging`]
#[derive(Debug)]
pub struct LogArgs<T: AsRef<Path>> {
    /// The filter directive to use. When not set, `SEARCH_LOG_LEVEL` and then the default are used.
    pub log_level: Option<String>,
    /// Whether or not we log to stderr.
    pub log_to_stderr: bool,
    /// The log file path which we write logs to. When not set, we do not write to a file.
    pub log_file_path: Option<T>,
    /// Whether we should delete the log file at each launch.
    pub delete_old_log_file: bool,
}

/// Keeps the background writers alive; logs are lost once this is dropped.
#[must_use]
#[derive(Debug)]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
    _stderr_guard: Option<WorkerGuard>,
}

pub fn initialize_logging<T: AsRef<Path>>(args: LogArgs<T>) -> Result<LogGuard, Error> {
    let filter_layer = create_filter_layer(args.log_level.as_deref());

    let (file_layer, _file_guard) = match args.log_file_path {
        Some(log_file_path) => {
            let log_path = log_file_path.as_ref();

            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            // Old logs are only dropped on request or once the file grows too large.
            if args.delete_old_log_file {
                std::fs::remove_file(log_path).ok();
            } else if log_path.exists() && std::fs::metadata(log_path)?.len() > MAX_FILE_SIZE {
                std::fs::remove_file(log_path)?;
            }

            let file = File::options().append(true).create(true).open(log_path)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(metadata) = file.metadata() {
                    let mut permissions = metadata.permissions();
                    permissions.set_mode(0o600);
                    file.set_permissions(permissions).ok();
                }
            }

            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let file_layer = fmt::layer()
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(non_blocking);

            (Some(file_layer), Some(guard))
        },
        None => (None, None),
    };

    let (stderr_layer, _stderr_guard) = if args.log_to_stderr {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
        let stderr_layer = fmt::layer().with_line_number(true).with_writer(non_blocking);
        (Some(stderr_layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard,
        _stderr_guard,
    })
}

/// The explicit level wins over `SEARCH_LOG_LEVEL`, which wins over the default.
fn create_filter_layer(log_level: Option<&str>) -> EnvFilter {
    let directive = Directive::from(DEFAULT_FILTER);

    let log_level = log_level
        .map(str::to_owned)
        .or_else(|| std::env::var(SEARCH_LOG_LEVEL).ok());

    match log_level {
        Some(level) => EnvFilter::builder()
            .with_default_directive(directive)
            .parse_lossy(level),
        None => EnvFilter::default().add_directive(directive),
    }
}
