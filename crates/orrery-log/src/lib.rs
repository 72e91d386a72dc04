//! Structured logging for the orrery.
//!
//! Installs a `tracing` subscriber with console output (uptime, module path,
//! level) and, in debug builds, an optional JSON log file. The filter comes
//! from `RUST_LOG` when set, otherwise from the config's `debug.log_level`.

use orrery_config::Config;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config says otherwise.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "orrery.log";

/// Filter string derived from the config, falling back to [`DEFAULT_FILTER`].
///
/// A bare level such as `debug` keeps the GPU crates at `warn` so they do
/// not drown out frame logs.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config.map(|c| c.debug.log_level.trim()) {
        Some(level) if !level.is_empty() && !level.contains(['=', ',']) => {
            format!("{level},wgpu=warn,naga=warn")
        }
        Some(level) if !level.is_empty() => level.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Path of the JSON log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging is enabled
/// * `config` - source of the `debug.log_level` filter
///
/// # Examples
///
/// ```no_run
/// use orrery_log::init_logging;
///
/// init_logging(None, false, None);
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directive(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_file_path(log_dir))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_without_config() {
        assert_eq!(filter_directive(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_bare_level_keeps_gpu_quiet() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        assert_eq!(filter_directive(Some(&config)), "debug,wgpu=warn,naga=warn");
    }

    #[test]
    fn test_full_directive_passes_through() {
        let mut config = Config::default();
        config.debug.log_level = "warn,orrery_app=trace".to_string();
        assert_eq!(filter_directive(Some(&config)), "warn,orrery_app=trace");
    }

    #[test]
    fn test_empty_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directive(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_directives_parse() {
        for directive in [
            DEFAULT_FILTER,
            "debug,orrery_orbit=trace",
            "warn,orrery_render=debug",
            "error",
        ] {
            assert!(EnvFilter::try_new(directive).is_ok(), "rejected {directive}");
        }
    }

    #[test]
    fn test_log_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file_path(dir.path());
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
        assert!(path.starts_with(dir.path()));
    }
}
