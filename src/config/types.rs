//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_TIMEOUT, MAX_REDIRECT_HOPS};
use crate::fetch::{Method, ProxyKind};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How the CLI prints the finished response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Status line, redirect trail and body text
    Plain,
    /// One JSON document describing the response
    Json,
}

/// Command-line options for the `http_request` binary.
#[derive(Debug, Parser)]
#[command(name = "http_request", version, about = "Perform one HTTP exchange, following redirects")]
pub struct Opt {
    /// Absolute http or https URL to request
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, value_enum, default_value = "get")]
    pub method: Method,

    /// Form field as `name=value`; repeatable
    #[arg(short = 'd', long = "data", value_name = "NAME=VALUE")]
    pub data: Vec<String>,

    /// Request header as `Name: value`; repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Send form data as multipart/form-data instead of URL-encoded
    #[arg(long)]
    pub multipart: bool,

    /// Forwarding proxy as `host:port`
    #[arg(long, value_name = "HOST:PORT")]
    pub proxy: Option<String>,

    /// Proxy protocol
    #[arg(long, value_enum, default_value = "http")]
    pub proxy_type: ProxyKind,

    /// Connect and read timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Do not follow redirects
    #[arg(long)]
    pub no_redirects: bool,

    /// Maximum number of redirects to follow
    #[arg(long, default_value_t = MAX_REDIRECT_HOPS)]
    pub max_redirects: usize,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Response output format
    #[arg(long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl Opt {
    /// Timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
