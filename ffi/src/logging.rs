use std::path::Path;

use k2_ctapi::settings::{DEFAULT_LOG_LEVEL, LOG_FILE};
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// Keeps the file writer flushing for the lifetime of the process.
static GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Installs the global subscriber, unless the host application already did.
/// Logs go to `ctehxk2.log` inside `log_dir`, or to stderr.
pub fn init(level: &str, log_dir: Option<&Path>) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(true)
        .with_thread_ids(true);

    let installed = match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
            let _ = GUARD.set(guard);

            builder.with_ansi(false).with_writer(writer).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Keeping the subscriber installed by the host");
    }
}

/// Everything at `error`, this library at `level`.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("error,k2_ctapi={level},ctehxk2={level}"))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn filter_accepts_levels_in_any_case() {
        assert_eq!(filter("Error").max_level_hint(), Some(LevelFilter::ERROR));
        assert_eq!(filter("DEBUG").max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(filter("trace").max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn filter_falls_back_on_invalid_level() {
        assert_eq!(filter("loud").max_level_hint(), Some(LevelFilter::ERROR));
    }
}
