use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::error::{DeployError, DeployResult};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the session log for a run started at `started`.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use dockhand::logging::log_file_name;
///
/// let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
/// assert_eq!(log_file_name(at), "deploy_20260304_050607.log");
/// ```
#[must_use]
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("deploy_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber: a console layer on stderr and a
/// plain-text session log in `dir`. The log always records at
/// debug level, which includes the output of every spawned
/// command. Returns the log path.
pub fn init(dir: &Path, verbose: bool) -> DeployResult<PathBuf> {
    let path = dir.join(log_file_name(Local::now()));
    let file = File::create(&path)?;

    let console_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(console_filter);

    let session_log = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(console)
        .with(session_log)
        .try_init()
        .map_err(|e| DeployError::Other(format!("cannot install logger: {e}")))?;

    Ok(path)
}
