use crate::registration::pipeline::{
    default_title, DEFAULT_CLUB_CODE, DEFAULT_FILE_PREFIX, DEFAULT_ORG_CODE, DEFAULT_ROSTER_PATH,
};
use crate::registration::{DocumentFormat, ExportSettings, FilenameStyle, OrderingPolicy};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub export: ExportSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            export: load_export_settings()?,
        })
    }
}

fn load_export_settings() -> Result<ExportSettings, ConfigError> {
    let roster_path = env::var("APP_ROSTER_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ROSTER_PATH));
    let org_code = env::var("APP_ORG_CODE").unwrap_or_else(|_| DEFAULT_ORG_CODE.to_string());
    let club_code = env::var("APP_CLUB_CODE").unwrap_or_else(|_| DEFAULT_CLUB_CODE.to_string());
    let title = env::var("APP_EXPORT_TITLE").unwrap_or_else(|_| default_title(&club_code));
    let file_prefix =
        env::var("APP_EXPORT_PREFIX").unwrap_or_else(|_| DEFAULT_FILE_PREFIX.to_string());

    let ordering = match env::var("APP_EXPORT_ORDERING") {
        Ok(value) => OrderingPolicy::parse(&value).ok_or(ConfigError::InvalidOrdering(value))?,
        Err(_) => OrderingPolicy::default(),
    };
    let default_format = match env::var("APP_EXPORT_FORMAT") {
        Ok(value) => DocumentFormat::parse(&value).ok_or(ConfigError::InvalidFormat(value))?,
        Err(_) => DocumentFormat::default(),
    };
    let filename_style = match env::var("APP_EXPORT_FILENAME_STYLE") {
        Ok(value) => {
            FilenameStyle::parse(&value).ok_or(ConfigError::InvalidFilenameStyle(value))?
        }
        Err(_) => FilenameStyle::default(),
    };
    let timestamp_filenames = match env::var("APP_EXPORT_TIMESTAMP") {
        Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
            name: "APP_EXPORT_TIMESTAMP",
            value,
        })?,
        Err(_) => false,
    };

    Ok(ExportSettings {
        roster_path,
        org_code,
        club_code,
        title,
        file_prefix,
        ordering,
        default_format,
        filename_style,
        timestamp_filenames,
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidOrdering(String),
    InvalidFormat(String),
    InvalidFilenameStyle(String),
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidOrdering(value) => write!(
                f,
                "APP_EXPORT_ORDERING must be 'selection' or 'rank' (got '{value}')"
            ),
            ConfigError::InvalidFormat(value) => {
                write!(f, "APP_EXPORT_FORMAT must be 'xlsx' or 'csv' (got '{value}')")
            }
            ConfigError::InvalidFilenameStyle(value) => write!(
                f,
                "APP_EXPORT_FILENAME_STYLE must be 'exam-code' or 'quarter' (got '{value}')"
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean flag (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_ROSTER_PATH",
            "APP_ORG_CODE",
            "APP_CLUB_CODE",
            "APP_EXPORT_TITLE",
            "APP_EXPORT_PREFIX",
            "APP_EXPORT_ORDERING",
            "APP_EXPORT_FORMAT",
            "APP_EXPORT_FILENAME_STYLE",
            "APP_EXPORT_TIMESTAMP",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.export, ExportSettings::default());
        assert_eq!(
            config.export.title,
            "DANH SÁCH ĐĂNG KÝ THAM DỰ THI THĂNG CẤP ĐAI TAEKWONDO CLB_01102"
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn export_settings_follow_env_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_CLUB_CODE", "CLB_777");
        env::set_var("APP_EXPORT_ORDERING", "rank");
        env::set_var("APP_EXPORT_FORMAT", "csv");
        env::set_var("APP_EXPORT_FILENAME_STYLE", "quarter");
        env::set_var("APP_EXPORT_TIMESTAMP", "yes");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.export.club_code, "CLB_777");
        assert!(config.export.title.ends_with("CLB_777"));
        assert_eq!(config.export.ordering, OrderingPolicy::RankThenSelection);
        assert_eq!(config.export.default_format, DocumentFormat::Csv);
        assert_eq!(config.export.filename_style, FilenameStyle::Quarter);
        assert!(config.export.timestamp_filenames);
    }

    #[test]
    fn rejects_unknown_ordering() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_EXPORT_ORDERING", "alphabetical");
        let error = AppConfig::load().expect_err("unknown ordering rejected");
        reset_env();
        assert!(matches!(error, ConfigError::InvalidOrdering(ref value) if value == "alphabetical"));
    }
}
