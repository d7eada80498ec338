// Logging setup - tracing subscriber with optional rotating file output
//
// Console logging always; JSON file logging optionally on top, via a
// non-blocking rolling appender. The returned guard must be kept alive for
// the duration of the program so buffered log lines flush on exit.
//
// Filter precedence: RUST_LOG env var > config file level > "info".

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

pub fn init(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = format!("gkpage={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    if !config.logging.file_enabled {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.logging.file_dir) {
        eprintln!(
            "Warning: Could not create log directory {:?}: {}",
            config.logging.file_dir, e
        );
        // Fall back to console-only logging
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        return None;
    }

    let file_appender =
        tracing_appender::rolling::daily(&config.logging.file_dir, &config.logging.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}
