//! Structured logging setup for hosts embedding the engine.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,fnb_revenue_engine=debug";

/// Install a console layer and, when `log_dir` is given, a daily rolling
/// file of JSON lines under it. `RUST_LOG` overrides the default filter.
///
/// Keep the returned guard alive: dropping it flushes and stops the file
/// writer. Fails if a global subscriber is already installed.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, String> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let console_layer = fmt::layer().with_target(true);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("create log dir {}: {e}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "fnb-revenue");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok(guard)
}
