use crate::indicators::{IndicatorSource, Stage};
use crate::performance::{InvalidReportYears, ReportYears};
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
    pub data: DataConfig,
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
        let cors_origins = split_list(env::var("EQUIDAR_CORS_ORIGINS").ok().as_deref());

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                cors_origins,
            },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
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

/// Where the indicator and infrastructure exports live, and which years the
/// reports lay their series on.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub early_grades_csv: PathBuf,
    pub late_grades_csv: PathBuf,
    pub upper_secondary_csv: PathBuf,
    pub infra_fundamental_csv: Option<PathBuf>,
    pub infra_secondary_csv: Option<PathBuf>,
    pub report_years: ReportYears,
}

impl DataConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let path = |key: &str, default: &str| {
            PathBuf::from(env::var(key).unwrap_or_else(|_| default.to_string()))
        };
        let optional_path = |key: &str| {
            env::var(key)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };

        let report_years = match env::var("EQUIDAR_REPORT_YEARS") {
            Ok(raw) => parse_report_years(&raw)?,
            Err(_) => ReportYears::default(),
        };

        Ok(Self {
            early_grades_csv: path("EQUIDAR_EF1_CSV", "data/IDEB_ANOS_INICIAIS_PB.csv"),
            late_grades_csv: path("EQUIDAR_EF2_CSV", "data/IDEB_ANOS_FINAIS_PB.csv"),
            upper_secondary_csv: path("EQUIDAR_EM_CSV", "data/IDEB_ENSINO_MEDIO_PB.csv"),
            infra_fundamental_csv: optional_path("EQUIDAR_INFRA_FUND_CSV"),
            infra_secondary_csv: optional_path("EQUIDAR_INFRA_MED_CSV"),
            report_years,
        })
    }

    /// The three stage exports in canonical stage order.
    pub fn indicator_sources(&self) -> Vec<IndicatorSource> {
        vec![
            IndicatorSource::new(Stage::EarlyGrades, &self.early_grades_csv),
            IndicatorSource::new(Stage::LateGrades, &self.late_grades_csv),
            IndicatorSource::new(Stage::UpperSecondary, &self.upper_secondary_csv),
        ]
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_report_years(raw: &str) -> Result<ReportYears, ConfigError> {
    let years = split_list(Some(raw))
        .iter()
        .map(|item| item.parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::InvalidReportYear(raw.to_string()))?;
    ReportYears::new(years).map_err(ConfigError::ReportYears)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidReportYear(String),
    ReportYears(InvalidReportYears),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidReportYear(raw) => write!(
                f,
                "EQUIDAR_REPORT_YEARS must be a comma-separated list of years, got '{raw}'"
            ),
            ConfigError::ReportYears(err) => write!(f, "EQUIDAR_REPORT_YEARS: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidReportYear(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::ReportYears(err) => Some(err),
        }
    }
}
