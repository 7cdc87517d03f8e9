//! Logging sink handed to the pipeline and its collaborators.
//!
//! The library itself logs through `tracing`. Collaborators (installer,
//! wrapper generator) receive a [`BuildLogger`] instead so that embedders can
//! route their output separately from the build's own diagnostics.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Capabilities every logger must provide, in the order they are reported.
pub const CAPABILITIES: [&str; 4] = ["info", "log", "warn", "error"];

/// A logging sink with four severities.
pub trait BuildLogger: Send + Sync {
    /// Low-priority progress output.
    fn log(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);
}

/// Default logger, forwards everything to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl BuildLogger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Where a single capability writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    Stderr,
    /// Discard messages.
    Silent,
    /// Forward to `tracing` at the capability's level.
    Tracing,
    /// Append to a file.
    File(PathBuf),
}

impl LogSink {
    /// Parse a sink name. Anything that is not a known keyword is a file path.
    pub fn parse(s: &str) -> Self {
        match s {
            "stdout" => LogSink::Stdout,
            "stderr" => LogSink::Stderr,
            "silent" | "off" => LogSink::Silent,
            "tracing" => LogSink::Tracing,
            path => LogSink::File(PathBuf::from(path)),
        }
    }
}

/// Logger declared in the build options: one sink per capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerSpec {
    pub log: LogSink,
    pub info: LogSink,
    pub warn: LogSink,
    pub error: LogSink,
}

impl LoggerSpec {
    /// Read a logger declaration from an options mapping.
    ///
    /// Returns the names of the missing capabilities when any of them is
    /// absent or not a string.
    pub fn from_mapping(map: &Map<String, Value>) -> Result<Self, Vec<&'static str>> {
        let sink = |name: &str| map.get(name).and_then(Value::as_str).map(LogSink::parse);

        let missing: Vec<&'static str> = CAPABILITIES
            .iter()
            .copied()
            .filter(|name| sink(*name).is_none())
            .collect();

        match (sink("log"), sink("info"), sink("warn"), sink("error")) {
            (Some(log), Some(info), Some(warn), Some(error)) => Ok(LoggerSpec {
                log,
                info,
                warn,
                error,
            }),
            _ => Err(missing),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Log,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Log => "log",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
enum Route {
    Stdout,
    Stderr,
    Silent,
    Tracing,
    File(Arc<Mutex<File>>),
}

/// Logger built from a [`LoggerSpec`].
#[derive(Debug)]
pub struct RoutedLogger {
    log: Route,
    info: Route,
    warn: Route,
    error: Route,
}

impl RoutedLogger {
    /// Open every sink of the spec. Capabilities sharing a file share a handle.
    pub fn open(spec: &LoggerSpec) -> Result<Self> {
        let mut files: HashMap<PathBuf, Arc<Mutex<File>>> = HashMap::new();
        let mut route = |sink: &LogSink| -> Result<Route> {
            Ok(match sink {
                LogSink::Stdout => Route::Stdout,
                LogSink::Stderr => Route::Stderr,
                LogSink::Silent => Route::Silent,
                LogSink::Tracing => Route::Tracing,
                LogSink::File(path) => match files.entry(path.clone()) {
                    Entry::Occupied(entry) => Route::File(Arc::clone(entry.get())),
                    Entry::Vacant(entry) => {
                        let handle = Arc::new(Mutex::new(open_append(path)?));
                        Route::File(Arc::clone(entry.insert(handle)))
                    }
                },
            })
        };

        Ok(RoutedLogger {
            log: route(&spec.log)?,
            info: route(&spec.info)?,
            warn: route(&spec.warn)?,
            error: route(&spec.error)?,
        })
    }

    fn write(&self, level: Level, message: &str) {
        let route = match level {
            Level::Log => &self.log,
            Level::Info => &self.info,
            Level::Warn => &self.warn,
            Level::Error => &self.error,
        };

        match route {
            Route::Stdout => println!("{}", message),
            Route::Stderr => eprintln!("{}", message),
            Route::Silent => {}
            Route::Tracing => match level {
                Level::Log => TracingLogger.log(message),
                Level::Info => TracingLogger.info(message),
                Level::Warn => TracingLogger.warn(message),
                Level::Error => TracingLogger.error(message),
            },
            Route::File(file) => {
                if let Ok(mut file) = file.lock() {
                    if let Err(e) = writeln!(file, "[{}] {}", level.as_str(), message) {
                        tracing::debug!("failed to write log message: {}", e);
                    }
                }
            }
        }
    }
}

impl BuildLogger for RoutedLogger {
    fn log(&self, message: &str) {
        self.write(Level::Log, message);
    }

    fn info(&self, message: &str) {
        self.write(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(Level::Error, message);
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file: {}", path.display()))
}

/// Build the logger declared in the options, or the default one.
pub fn logger_from_spec(spec: Option<&LoggerSpec>) -> Result<Arc<dyn BuildLogger>> {
    match spec {
        Some(spec) => Ok(Arc::new(RoutedLogger::open(spec)?)),
        None => Ok(Arc::new(TracingLogger)),
    }
}
