//! Structured logging for the flood alert pipeline.
//!
//! Context-rich logging with component and location identifiers, timestamps,
//! and severity levels. Supports console output and optional file-based
//! logging for daemon operation. Nothing in the core surfaces errors to an
//! end user — these logs are the only failure visibility.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::ProviderError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline components
// ---------------------------------------------------------------------------

/// Which part of the pipeline emitted a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Collector,
    Aggregator,
    Risk,
    Dispatcher,
    Scheduler,
    Store,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Collector => write!(f, "COLLECT"),
            Component::Aggregator => write!(f, "AGGREGATE"),
            Component::Risk => write!(f, "RISK"),
            Component::Dispatcher => write!(f, "DISPATCH"),
            Component::Scheduler => write!(f, "SCHED"),
            Component::Store => write!(f, "DB"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - transient provider conditions like rate limiting
    Expected,
    /// Unexpected failure - indicates service degradation or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify a provider failure to pick a log severity.
///
/// Rate limits and transient network faults are part of normal operation and
/// recover on the next cycle; parse errors suggest the provider changed its
/// payload and deserve attention.
pub fn classify_provider_failure(err: &ProviderError) -> FailureType {
    match err {
        ProviderError::RateLimited => FailureType::Expected,
        ProviderError::Network(_) => FailureType::Expected,
        ProviderError::Parse(_) | ProviderError::MissingField(_) => FailureType::Unexpected,
        ProviderError::Http(code) if *code >= 500 => FailureType::Unknown,
        ProviderError::Http(_) => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>) {
        *LOGGER.lock().unwrap() = Some(Logger {
            min_level,
            log_file,
        });
    }

    fn log(&self, level: LogLevel, component: Component, location: Option<i32>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let location_part = location.map(|id| format!(" [loc {}]", id)).unwrap_or_default();
        let entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, component, location_part, message
        );

        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", entry),
            _ => println!("{}", entry),
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) {
    Logger::init(min_level, log_file.map(String::from));
}

pub fn info(component: Component, location: Option<i32>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, component, location, message);
    }
}

pub fn warn(component: Component, location: Option<i32>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, component, location, message);
    }
}

pub fn error(component: Component, location: Option<i32>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, component, location, message);
    }
}

pub fn debug(component: Component, location: Option<i32>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, component, location, message);
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a weather provider failure with automatic classification.
pub fn log_provider_failure(location: i32, err: &ProviderError) {
    let failure_type = classify_provider_failure(err);
    let message = format!("fetch failed [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => debug(Component::Collector, Some(location), &message),
        FailureType::Unexpected => error(Component::Collector, Some(location), &message),
        FailureType::Unknown => warn(Component::Collector, Some(location), &message),
    }
}

/// Log the end-of-cycle summary at a severity matching its outcome.
pub fn log_cycle_summary(
    locations: usize,
    failures: usize,
    assessments: usize,
    alerts_sent: usize,
    alerts_failed: usize,
) {
    let message = format!(
        "cycle complete: {}/{} locations ok, {} assessments, {} alerts sent, {} alerts failed",
        locations.saturating_sub(failures),
        locations,
        assessments,
        alerts_sent,
        alerts_failed
    );

    if failures == 0 && alerts_failed == 0 {
        info(Component::Scheduler, None, &message);
    } else if failures == locations && locations > 0 {
        error(Component::Scheduler, None, &message);
    } else {
        warn(Component::Scheduler, None, &message);
    }
}
