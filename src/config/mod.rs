use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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

/// Top-level configuration for the diagnosis service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub diagnosis: DiagnosisConfig,
    pub recommendation: RecommendationConfig,
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

        let definition_path = non_empty_var("DIAGNOSIS_DEFINITION_PATH").map(PathBuf::from);

        let base_url = non_empty_var("RECOMMENDATION_BASE_URL");
        let timeout_secs = env::var("RECOMMENDATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidRecommendationTimeout)?;
        let limit = env::var("RECOMMENDATION_LIMIT")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<usize>()
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or(ConfigError::InvalidRecommendationLimit)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            diagnosis: DiagnosisConfig { definition_path },
            recommendation: RecommendationConfig {
                base_url,
                timeout_secs,
                limit,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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

/// Where the quiz definition comes from. `None` means the built-in standard quiz.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisConfig {
    pub definition_path: Option<PathBuf>,
}

/// Recommendation collaborator settings. Without a base URL the in-process catalog answers.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub limit: usize,
}

impl RecommendationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 5,
            limit: 3,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRecommendationTimeout,
    InvalidRecommendationLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRecommendationTimeout => {
                write!(f, "RECOMMENDATION_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidRecommendationLimit => {
                write!(f, "RECOMMENDATION_LIMIT must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidRecommendationTimeout
            | ConfigError::InvalidRecommendationLimit => None,
        }
    }
}
