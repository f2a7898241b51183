// ============================================================
// Layer 6 — Run Log
// ============================================================
// Sends everything one training run logs to both the console
// and a file in the sweep root (log_<suffix>), like piping the
// run through `tee -a`.
//
// The subscriber is installed only for the duration of the
// closure, so each trial of a sweep gets its own file while
// the global subscriber set up in main stays untouched.

use anyhow::{Context, Result};
use std::{fs, path::Path};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Run `f` with logs teed into `dir/file_name` (appending).
pub fn with_run_log<T>(
    dir:       impl AsRef<Path>,
    file_name: &str,
    f:         impl FnOnce() -> Result<T>,
) -> Result<T> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, _guard) = tracing_appender::non_blocking(appender);

    let subscriber = tracing_subscriber::registry()
        .with(console_filter())
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(writer));

    // _guard flushes the file when it drops at the end of this function
    tracing::subscriber::with_default(subscriber, f)
}

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resnet_cifar=info"))
}
