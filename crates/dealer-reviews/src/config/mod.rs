use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DEALERSHIP_URL: &str = "http://127.0.0.1:3001/api/dealership";
const DEFAULT_REVIEW_URL: &str = "http://127.0.0.1:5000/api/review";
const DEFAULT_NLU_VERSION: &str = "2021-08-01";
/// Two weeks, matching the usual login cookie lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

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
    pub upstream: UpstreamConfig,
    pub sentiment: Option<SentimentConfig>,
    pub catalog_fixture: Option<PathBuf>,
    pub session_ttl: Duration,
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

        let timeout_secs = env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let upstream = UpstreamConfig {
            dealership_url: url_var("DEALERSHIP_API_URL", DEFAULT_DEALERSHIP_URL)?,
            review_url: url_var("REVIEW_API_URL", DEFAULT_REVIEW_URL)?,
            timeout: Duration::from_secs(timeout_secs),
        };

        let sentiment = match (non_empty_var("NLU_API_URL"), non_empty_var("NLU_API_KEY")) {
            (Some(url), Some(api_key)) => {
                check_url("NLU_API_URL", &url)?;
                Some(SentimentConfig {
                    url,
                    api_key,
                    version: env::var("NLU_API_VERSION")
                        .unwrap_or_else(|_| DEFAULT_NLU_VERSION.to_string()),
                })
            }
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteSentiment),
        };

        let catalog_fixture = non_empty_var("CATALOG_FIXTURE").map(PathBuf::from);

        let session_ttl = match non_empty_var("SESSION_TTL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidSessionTtl)?,
            None => DEFAULT_SESSION_TTL,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            upstream,
            sentiment,
            catalog_fixture,
            session_ttl,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn url_var(key: &'static str, default: &str) -> Result<String, ConfigError> {
    let url = non_empty_var(key).unwrap_or_else(|| default.to_string());
    check_url(key, &url)?;
    Ok(url)
}

fn check_url(key: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl { key })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Endpoints of the cloud functions fronting the dealership document store.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub dealership_url: String,
    pub review_url: String,
    pub timeout: Duration,
}

/// Natural language understanding credentials.
#[derive(Clone)]
pub struct SentimentConfig {
    pub url: String,
    pub api_key: String,
    pub version: String,
}

impl fmt::Debug for SentimentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidUrl { key: &'static str },
    IncompleteSentiment,
    InvalidSessionTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "UPSTREAM_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidUrl { key } => write!(f, "{key} must be an http(s) URL"),
            ConfigError::IncompleteSentiment => {
                write!(f, "NLU_API_URL and NLU_API_KEY must be set together")
            }
            ConfigError::InvalidSessionTtl => {
                write!(f, "SESSION_TTL_SECS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidUrl { .. }
            | ConfigError::IncompleteSentiment
            | ConfigError::InvalidSessionTtl => None,
        }
    }
}
