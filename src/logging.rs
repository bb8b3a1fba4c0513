use std::{io::IsTerminal, path::PathBuf};

use ophelia_bot::infrastructure::environment::{self, get_log_directory};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "warn,ophelia_bot=info";
const LOG_FILE_PREFIX: &str = "ophelia.log";

/// Loads `.env` and installs the global subscriber. Keep the guard alive for as long as file
/// logging should be flushed.
pub fn init_logger() -> WorkerGuard {
    let env_file = load_env_file();
    let guard = init_tracing();
    info!("Starting Ophelia Store Bot...");
    log_env_file_result(env_file);
    guard
}

fn get_log_path_var() -> Option<bool> {
    let value = std::env::var(environment::LOG_PATH).ok()?;
    match value.parse::<bool>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to parse {}: {:?}", environment::LOG_PATH, e);
            None
        }
    }
}

fn use_ansi(style: Option<&str>) -> bool {
    match style.map(str::to_lowercase).as_deref() {
        Some("never") => false,
        Some("auto") => std::io::stdout().is_terminal(),
        _ => true,
    }
}

fn init_tracing() -> WorkerGuard {
    let filter = EnvFilter::try_from_env(environment::LOG_LEVEL)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let style = std::env::var(environment::LOG_STYLE).ok();
    let with_source = get_log_path_var().unwrap_or(false);

    let file_appender = tracing_appender::rolling::daily(get_log_directory(), LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(use_ansi(style.as_deref()))
                .with_file(with_source)
                .with_line_number(with_source),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_file(with_source)
                .with_line_number(with_source),
        )
        .init();
    guard
}

fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

fn log_env_file_result(env_file: Option<PathBuf>) {
    if let Some(path) = env_file {
        info!("Loaded environment variables from {}", path.display());
    } else {
        info!("No .env file found, proceeding with system environment variables.");
    }
}
