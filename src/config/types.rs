// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads; defaults to the CPU core count
    pub workers: Option<usize>,
}

/// Media root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Directory beneath which all servable files must reside
    pub root: String,
    /// Files tried in order when a directory is requested
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    /// Render a listing for a directory without an index file instead of 404
    #[serde(default)]
    pub directory_listing: bool,
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PerformanceConfig {
    /// Reject connections beyond this count at accept time
    pub max_connections: Option<u64>,
}
