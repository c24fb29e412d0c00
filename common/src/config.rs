//! Application configuration.
//!
//! All settings come from environment variables with sensible defaults,
//! so the binary runs without any configuration file.

use std::path::PathBuf;

/// Default maximum upload size in megabytes.
const DEFAULT_MAX_UPLOAD_MB: u64 = 100;

/// Application configuration shared across the process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name (used in logs and response metadata).
    pub service: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Directory holding uploaded database files.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Timeout for establishing a database connection, in seconds.
    pub connect_timeout_secs: u64,
    /// Token required for destructive operations. Destructive endpoints
    /// are disabled when unset.
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Loads configuration from the environment for the given service name.
    pub fn load_with_service(service: &str) -> Self {
        let max_upload_mb = env_parse("MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB);

        Self {
            service: service.to_string(),
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: 0, // set by the binary from SERVER_PORT or its default
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_upload_bytes: (max_upload_mb * 1024 * 1024) as usize,
            connect_timeout_secs: env_parse("CONNECT_TIMEOUT_SECS", 10),
            admin_token: std::env::var("DBVIEWER_ADMIN_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
