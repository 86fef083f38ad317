use chrono::{DateTime, Local, Utc};
use crossterm::style::{Color, Stylize};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses the level names accepted in `LoggingConfig::level`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn color(&self) -> Color {
        match self {
            LogLevel::Debug => Color::Cyan,
            LogLevel::Info => Color::Green,
            LogLevel::Warning => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: i64,
    pub level: LogLevel,
    pub module: String,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
}

pub struct Logger {
    log_file_path: Option<String>,
    console_output: bool,
    min_level: LogLevel,
}

impl Logger {
    pub fn new(log_file_path: Option<&str>, console_output: bool, min_level: LogLevel) -> Self {
        Self {
            log_file_path: log_file_path.map(str::to_string),
            console_output,
            min_level,
        }
    }

    pub fn log(&self, level: LogLevel, module: &str, message: &str, metadata: Option<serde_json::Value>) {
        if !self.should_log(level) {
            return;
        }

        let entry = LogEntry {
            timestamp: Utc::now().timestamp(),
            level,
            module: module.to_string(),
            message: message.to_string(),
            metadata,
        };

        // stdout carries the report, so diagnostics go to stderr
        if self.console_output {
            self.print_to_console(&entry);
        }

        if let Some(path) = &self.log_file_path {
            if let Err(e) = write_to_file(path, &entry) {
                eprintln!("Failed to write to log file: {}", e);
            }
        }
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn print_to_console(&self, entry: &LogEntry) {
        let local_time: DateTime<Local> = DateTime::from_timestamp(entry.timestamp, 0)
            .unwrap_or_default()
            .with_timezone(&Local);

        let line = format!(
            "[{}] [{}] {}: {}",
            local_time.format("%Y-%m-%d %H:%M:%S"),
            entry.level.label(),
            entry.module,
            entry.message
        );
        eprintln!("{}", line.with(entry.level.color()));

        if let Some(ref metadata) = entry.metadata {
            eprintln!("  Metadata: {}", serde_json::to_string_pretty(metadata).unwrap_or_default());
        }
    }
}

fn write_to_file(log_file_path: &str, entry: &LogEntry) -> io::Result<()> {
    if let Some(parent) = Path::new(log_file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    let json_entry = serde_json::to_string(entry)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    writeln!(file, "{}", json_entry)?;
    file.flush()
}

// Global logger instance
use std::sync::OnceLock;

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn init_logger(log_file_path: Option<&str>, console_output: bool, min_level: LogLevel) {
    let logger = Logger::new(log_file_path, console_output, min_level);
    GLOBAL_LOGGER.set(logger).ok();
}

fn with_logger(level: LogLevel, module: &str, message: &str, metadata: Option<serde_json::Value>) {
    if let Some(logger) = GLOBAL_LOGGER.get() {
        logger.log(level, module, message, metadata);
    }
}

pub fn log_debug(module: &str, message: &str) {
    with_logger(LogLevel::Debug, module, message, None);
}

pub fn log_info(module: &str, message: &str) {
    with_logger(LogLevel::Info, module, message, None);
}

pub fn log_warning(module: &str, message: &str) {
    with_logger(LogLevel::Warning, module, message, None);
}

pub fn log_error(module: &str, message: &str) {
    with_logger(LogLevel::Error, module, message, None);
}

pub fn log_info_with_metadata(module: &str, message: &str, metadata: serde_json::Value) {
    with_logger(LogLevel::Info, module, message, Some(metadata));
}

// Convenience macros
#[macro_export]
macro_rules! log_debug {
    ($module:expr, $($arg:tt)*) => {
        $crate::core::logging::log_debug($module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $($arg:tt)*) => {
        $crate::core::logging::log_info($module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($module:expr, $($arg:tt)*) => {
        $crate::core::logging::log_warning($module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $($arg:tt)*) => {
        $crate::core::logging::log_error($module, &format!($($arg)*))
    };
}
