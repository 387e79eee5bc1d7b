use std::fmt;

use clap::ValueEnum;

/// Targets of the garage's own crates.
const GARAGE_TARGETS: [&str; 5] = ["garage", "engine", "runtime", "runtime_local", "car_services"];

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Completely disables logging
    Off,
    /// Only errors from garage libraries
    Error,
    /// Warnings and errors from garage libraries
    Warn,
    /// Info, warning and error messages from garage libraries
    #[default]
    Info,
    /// Debug, info, warning and error messages from garage libraries
    Debug,
    /// Trace, debug, info, warning and error messages from all dependencies
    Trace,
}

impl LogLevel {
    pub(crate) fn as_filter_str(&self) -> String {
        match self {
            LogLevel::Off => "off".to_string(),
            LogLevel::Trace => "trace".to_string(),
            level => {
                let mut directives = GARAGE_TARGETS
                    .iter()
                    .map(|target| format!("{target}={level}"))
                    .collect::<Vec<_>>();
                directives.push("off".to_string());
                directives.join(",")
            }
        }
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Standard text
    Text,
    /// JSON objects
    Json,
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}
