use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directives, e.g. `ccr_desktop=debug`.
pub const LOG_FILTER_ENV: &str = "CCR_DESKTOP_LOG";
/// Base path of an optional log file.
pub const LOG_FILE_ENV: &str = "CCR_DESKTOP_LOG_FILE";

const DEFAULT_FILTER: &str = "warn";

/// Initialize tracing: stderr always, plus a file when `CCR_DESKTOP_LOG_FILE`
/// is set.
///
/// Log files get unique names so concurrent runs never share one:
/// `{path}.{timestamp}.{pid}`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(UtcTime::rfc_3339());

    let file_layer = std::env::var(LOG_FILE_ENV)
        .ok()
        .and_then(|base| open_log_file(&base))
        .map(|file| {
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(UtcTime::rfc_3339())
        });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}

fn open_log_file(base: &str) -> Option<std::fs::File> {
    let path = unique_log_path(base, chrono::Utc::now().timestamp(), std::process::id());
    match std::fs::File::create(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: Failed to create log file {}: {}", path, e);
            None
        }
    }
}

fn unique_log_path(base: &str, timestamp: i64, pid: u32) -> String {
    format!("{}.{}.{}", base, timestamp, pid)
}
