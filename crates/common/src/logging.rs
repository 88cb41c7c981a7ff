// Sempred - Semantic Predicate Evaluator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging configuration for Sempred components
//!
//! Provides centralized logging setup with:
//! - Colorful console output with structured formatting
//! - Optional file logging to a temporary directory
//! - Environment variable support (RUST_LOG)
//! - Default INFO level

use eyre::{eyre, Result};
use std::{env, fs, path::PathBuf, sync::Once};
use tracing::{Level, Subscriber};
use tracing_appender::{non_blocking, non_blocking::NonBlocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::LocalTime, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Name of the directory under the system temp folder that holds log files.
const LOG_DIR_NAME: &str = "sempred-logs";

/// Initialize logging for a Sempred component
///
/// This function sets up:
/// - Pretty console logging with timestamps and source locations
/// - File logging with daily rotation, when `enable_file_logging` is set
/// - Level selection through `RUST_LOG`, defaulting to INFO
///
/// # Arguments
/// * `component_name` - Name of the component (e.g., "sempred")
/// * `enable_file_logging` - Whether to also write logs under the temp directory
///
/// # Examples
/// ```rust,ignore
/// use sempred_common::logging;
///
/// fn main() -> eyre::Result<()> {
///     logging::init_logging("sempred", false)?;
///     tracing::info!("Debugger attached");
///     Ok(())
/// }
/// ```
pub fn init_logging(component_name: &str, enable_file_logging: bool) -> Result<()> {
    if enable_file_logging {
        let log_dir = create_log_directory(component_name)?;

        let file_appender = rolling::daily(&log_dir, format!("{component_name}.log"));
        let (non_blocking_appender, guard) = non_blocking(file_appender);

        // The writer must outlive every event; the process exits shortly after main returns.
        std::mem::forget(guard);

        layered_subscriber(std::io::stderr, Some(non_blocking_appender))?
            .try_init()
            .map_err(|e| eyre!("Failed to initialize tracing subscriber: {e}"))?;

        tracing::info!(
            component = component_name,
            log_dir = %log_dir.display(),
            "Logging initialized with console and file output"
        );
    } else {
        layered_subscriber(std::io::stderr, None::<NonBlocking>)?
            .try_init()
            .map_err(|e| eyre!("Failed to initialize tracing subscriber: {e}"))?;

        tracing::debug!(component = component_name, "Logging initialized with console output only");
    }

    log_environment_info(component_name);

    Ok(())
}

/// Console layer plus optional file layer, each with its own filter.
fn layered_subscriber<C, F>(
    console_writer: C,
    file_writer: Option<F>,
) -> Result<impl Subscriber + Send + Sync + 'static>
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(true)
        .with_writer(console_writer)
        .pretty()
        .with_filter(filter_for_console()?);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(LocalTime::rfc_3339())
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter_for_file())
    });

    Ok(tracing_subscriber::registry().with(console_layer).with(file_layer))
}

/// Build a filter from `RUST_LOG`, falling back to `level`.
fn default_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .map_err(|e| eyre!("Failed to create environment filter: {e}"))
}

/// Create log directory in system temp folder
fn create_log_directory(component_name: &str) -> Result<PathBuf> {
    let log_dir = env::temp_dir().join(LOG_DIR_NAME).join(component_name);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Filter for console output - INFO unless RUST_LOG says otherwise
fn filter_for_console() -> Result<EnvFilter> {
    default_filter(Level::INFO)
}

/// Filter for file output - trace every evaluation unless RUST_LOG says otherwise
fn filter_for_file() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sempred_engine=trace"))
}

fn log_environment_info(component_name: &str) {
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let args: Vec<String> = env::args().collect();

    tracing::debug!(
        component = component_name,
        rust_log = %rust_log,
        args = ?args,
        "Environment information"
    );
}

/// Initialize simple logging (console only, compact formatting)
///
/// This is useful for tests or small tools that don't need the full setup.
///
/// # Arguments
/// * `level` - The default log level to use
pub fn init_simple_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(level)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| eyre!("Failed to initialize simple logging: {e}"))?;

    Ok(())
}

static TEST_LOGGING_INIT: Once = Once::new();

/// Safe logging initialization for tests - can be called multiple times
///
/// Uses `std::sync::Once` so initialization happens at most once per test process.
/// Output is console only, INFO by default, and respects `RUST_LOG`.
///
/// # Usage
/// ```rust,ignore
/// use sempred_common::logging;
///
/// #[test]
/// fn my_test() {
///     logging::ensure_test_logging(None);
///     tracing::info!("Logging works in any test");
/// }
/// ```
pub fn ensure_test_logging(default_level: Option<Level>) {
    TEST_LOGGING_INIT.call_once(|| {
        // A subscriber installed elsewhere is fine for tests.
        let _ = init_simple_logging(default_level.unwrap_or(Level::INFO));
    });
}
