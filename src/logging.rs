//! Console and log-file output through the `log` facade
//!
//! Two `env_logger` loggers sit behind one `log::Log` implementation: the
//! console one follows `-v` and `RUST_LOG`, the file one always records
//! `debug` and up.

use chrono::Local;
use env_logger::fmt::Formatter;
use env_logger::{Builder, Logger, Target, WriteStyle};
use log::{LevelFilter, Log, Metadata, Record, info};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::LogSettings;
use crate::error::{FtsError, Result};

const BANNER_WIDTH: usize = 72;
const SECTION_WIDTH: usize = 47;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

/// Rule framing the start and end of a run
pub fn banner_rule() -> String {
    "=".repeat(BANNER_WIDTH)
}

/// Rule framing each file transfer
pub fn section_rule() -> String {
    "-".repeat(SECTION_WIDTH)
}

/// Stand-in for a secret in log lines
pub fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

fn write_record(buf: &mut Formatter, record: &Record) -> std::io::Result<()> {
    writeln!(
        buf,
        "{} - {} - {}",
        Local::now().format(TIMESTAMP_FORMAT),
        record.level(),
        record.args()
    )
}

fn console_logger(verbose: bool) -> Logger {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(Target::Stderr)
        .format(write_record)
        .build()
}

fn file_logger(path: &Path) -> Result<Logger> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Ok(Builder::new()
        .filter_level(LevelFilter::Debug)
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .format(write_record)
        .build())
}

struct DualLogger {
    console: Logger,
    file: Logger,
}

impl Log for DualLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.file.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.console.log(record);
        self.file.log(record);
    }

    fn flush(&self) {
        self.console.flush();
        self.file.flush();
    }
}

/// Install the console and file loggers; returns the log file path
pub fn init(settings: &LogSettings, verbose: bool) -> Result<PathBuf> {
    let directory = Path::new(&settings.directory);
    if !directory.is_dir() {
        fs::create_dir_all(directory)?;
    }
    let path = directory.join(&settings.file);

    let logger = DualLogger {
        console: console_logger(verbose),
        file: file_logger(&path)?,
    };
    let max_level = logger.console.filter().max(logger.file.filter());

    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| FtsError::ConfigInvalid(format!("Logger already installed: {}", e)))?;
    log::set_max_level(max_level);

    Ok(path)
}

/// Opening banner of a run
pub fn log_start() {
    info!("{}", banner_rule());
    info!("SCRIPT LOG - Start");
    info!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("{}", banner_rule());
}

/// Closing banner of a run
pub fn log_end(log_file: &Path) {
    info!("End of program");
    info!("Logged everything in {}", log_file.display());
    info!("{}", banner_rule());
    info!("SCRIPT LOG - End");
    info!("{}", banner_rule());
    log::logger().flush();
}
