use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub limits: LimitsConfig,

    pub sales: SalesConfig,

    pub low_stock: LowStockConfig,

    pub mail: MailConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory uploaded product images are written to (served under `/images`)
    pub images_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/stockplus.db".to_string(),
            log_level: "info".to_string(),
            images_path: "images".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Secret used to sign session cookies. Must be at least 64 bytes,
    /// otherwise a random key is generated at startup and sessions do not
    /// survive a restart.
    pub session_secret: String,

    pub session_expiry_minutes: i64,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            session_secret: String::new(),
            session_expiry_minutes: 60,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Document creation is refused once this many documents exist
    pub max_documents: u64,

    /// Maximum request body for uploads (images, spreadsheets)
    pub max_upload_mb: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_documents: 50,
            max_upload_mb: 10,
        }
    }
}

/// What a sale does when it asks for more units than are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OversellPolicy {
    /// Fail the whole sale batch
    #[default]
    Reject,
    /// Floor the quantity at zero
    Clamp,
    /// Let the quantity go negative
    Allow,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SalesConfig {
    pub oversell_policy: OversellPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LowStockConfig {
    pub enabled: bool,

    /// Items with a quantity strictly below this value are reported
    pub threshold: i64,

    /// Daily wall-clock time of the report, `HH:MM`
    pub report_time: String,

    /// IANA timezone the report time is interpreted in
    pub timezone: String,

    pub recipient: String,

    /// Skip the report when one was already sent for the same local date
    pub dedupe_daily: bool,
}

impl Default for LowStockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 5,
            report_time: "09:00".to_string(),
            timezone: "Europe/London".to_string(),
            recipient: "stock@example.com".to_string(),
            dedupe_daily: true,
        }
    }
}

impl LowStockConfig {
    /// Parses `report_time` into (hour, minute).
    pub fn parse_report_time(&self) -> Result<(u32, u32)> {
        let (hour, minute) = self
            .report_time
            .trim()
            .split_once(':')
            .with_context(|| format!("Invalid report time '{}', expected HH:MM", self.report_time))?;

        let hour: u32 = hour
            .parse()
            .with_context(|| format!("Invalid report hour '{hour}'"))?;
        let minute: u32 = minute
            .parse()
            .with_context(|| format!("Invalid report minute '{minute}'"))?;

        if hour > 23 || minute > 59 {
            anyhow::bail!("Report time '{}' is out of range", self.report_time);
        }

        Ok((hour, minute))
    }

    pub fn parse_timezone(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {e}", self.timezone))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// When disabled, digests are written to the log instead of being sent
    pub enabled: bool,

    /// HTTP endpoint of the mail relay
    pub api_url: String,

    pub api_key: String,

    pub from: String,

    pub request_timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: String::new(),
            api_key: String::new(),
            from: "StockPlus <noreply@example.com>".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            limits: LimitsConfig::default(),
            sales: SalesConfig::default(),
            low_stock: LowStockConfig::default(),
            mail: MailConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and deployment-specific values can come from the environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("STOCKPLUS_DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Ok(port) = std::env::var("STOCKPLUS_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid STOCKPLUS_PORT: {port}"))?;
        }
        if let Ok(secret) = std::env::var("STOCKPLUS_SESSION_SECRET") {
            self.server.session_secret = secret;
        }
        if let Ok(key) = std::env::var("STOCKPLUS_MAIL_API_KEY") {
            self.mail.api_key = key;
        }
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("stockplus").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stockplus").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.low_stock.enabled {
            self.low_stock.parse_report_time()?;
            self.low_stock.parse_timezone()?;

            if self.low_stock.recipient.trim().is_empty() {
                anyhow::bail!("Low-stock recipient cannot be empty when the report is enabled");
            }
        }

        if self.mail.enabled && self.mail.api_url.is_empty() {
            anyhow::bail!("Mail API URL cannot be empty when mail is enabled");
        }

        if self.general.max_db_connections == 0 {
            anyhow::bail!("max_db_connections must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.limits.max_documents, 50);
        assert_eq!(config.low_stock.threshold, 5);
        assert_eq!(config.low_stock.timezone, "Europe/London");
        assert_eq!(config.sales.oversell_policy, OversellPolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[low_stock]"));
        assert!(toml_str.contains("oversell_policy = \"reject\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [limits]
            max_documents = 5

            [sales]
            oversell_policy = "clamp"

            [low_stock]
            report_time = "17:59"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.limits.max_documents, 5);
        assert_eq!(config.sales.oversell_policy, OversellPolicy::Clamp);
        assert_eq!(config.low_stock.parse_report_time().unwrap(), (17, 59));

        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_report_time_validation() {
        let mut low_stock = LowStockConfig::default();
        assert_eq!(low_stock.parse_report_time().unwrap(), (9, 0));

        low_stock.report_time = "24:00".to_string();
        assert!(low_stock.parse_report_time().is_err());

        low_stock.report_time = "nine".to_string();
        assert!(low_stock.parse_report_time().is_err());
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let mut config = Config::default();
        config.low_stock.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        config.low_stock.enabled = false;
        assert!(config.validate().is_ok());
    }
}
