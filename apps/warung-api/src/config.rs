//! # API Configuration
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. Config file: `$WARUNG_CONFIG`, else `<config dir>/warung.toml`
//! 3. `WARUNG_*` environment variables
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [database]
//! path = "/var/lib/warung/warung.db"
//!
//! [auth]
//! enabled = true
//! jwt_secret = "..."
//!
//! [notification]
//! webhook_url = "https://push.example.com/warung"
//!
//! [marketplace.shopee]
//! partner_id = 1000001
//! partner_key = "..."
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use warung_sync::{LazadaConfig, ShopeeConfig};

const DEV_JWT_SECRET: &str = "warung-dev-secret-change-in-production";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let path = directories::ProjectDirs::from("id", "warung", "pos")
            .map(|dirs| dirs.data_dir().join("warung.db"))
            .unwrap_or_else(|| PathBuf::from("warung.db"));
        DatabaseSettings {
            path,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub enabled: bool,
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub token_lifetime_secs: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            enabled: true,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_lifetime_secs: 12 * 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            webhook_url: None,
            webhook_secret: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopeeSettings {
    #[serde(default = "default_shopee_base_url")]
    pub base_url: String,
    pub partner_id: i64,
    pub partner_key: String,
}

fn default_shopee_base_url() -> String {
    "https://partner.shopeemobile.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LazadaSettings {
    #[serde(default = "default_lazada_base_url")]
    pub base_url: String,
    pub app_key: String,
    pub app_secret: String,
}

fn default_lazada_base_url() -> String {
    "https://auth.lazada.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceSettings {
    /// How often each platform's token is checked.
    pub refresh_interval_secs: u64,
    pub shopee: Option<ShopeeSettings>,
    pub lazada: Option<LazadaSettings>,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        MarketplaceSettings {
            refresh_interval_secs: 600,
            shopee: None,
            lazada: None,
        }
    }
}

impl MarketplaceSettings {
    pub fn shopee_config(&self) -> Option<ShopeeConfig> {
        self.shopee.as_ref().map(|s| ShopeeConfig {
            base_url: s.base_url.clone(),
            partner_id: s.partner_id,
            partner_key: s.partner_key.clone(),
        })
    }

    pub fn lazada_config(&self) -> Option<LazadaConfig> {
        self.lazada.as_ref().map(|s| LazadaConfig {
            base_url: s.base_url.clone(),
            app_key: s.app_key.clone(),
            app_secret: s.app_secret.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info,warung_api=debug,tower_http=info".to_string(),
            json: false,
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub notification: NotificationSettings,
    pub marketplace: MarketplaceSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads defaults, then the config file, then the process environment.
    ///
    /// Runs before logging is initialised; the `info!`/`debug!` calls here
    /// only show up when a subscriber already exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WARUNG_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading config file");
                Self::from_toml(&std::fs::read_to_string(&path)?)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `WARUNG_*` overrides from `var`.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        }

        if let Some(v) = var("WARUNG_PORT") {
            self.server.port = parse("WARUNG_PORT", v)?;
        }
        if let Some(v) = var("WARUNG_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = var("WARUNG_DATABASE_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = var("WARUNG_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = var("WARUNG_AUTH_ENABLED") {
            self.auth.enabled = parse_bool("WARUNG_AUTH_ENABLED", &v)?;
        }
        if let Some(v) = var("WARUNG_WEBHOOK_URL") {
            self.notification.webhook_url = Some(v).filter(|u| !u.is_empty());
        }
        if let Some(v) = var("WARUNG_WEBHOOK_SECRET") {
            self.notification.webhook_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = var("WARUNG_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = var("WARUNG_LOG_JSON") {
            self.logging.json = parse_bool("WARUNG_LOG_JSON", &v)?;
        }
        if let Some(v) = var("WARUNG_MARKETPLACE_REFRESH_SECS") {
            self.marketplace.refresh_interval_secs = parse("WARUNG_MARKETPLACE_REFRESH_SECS", v)?;
        }

        // Marketplace credentials: a partner id/app key switches the platform on
        if let Some(id) = var("WARUNG_SHOPEE_PARTNER_ID") {
            self.marketplace.shopee = Some(ShopeeSettings {
                base_url: var("WARUNG_SHOPEE_BASE_URL").unwrap_or_else(default_shopee_base_url),
                partner_id: parse("WARUNG_SHOPEE_PARTNER_ID", id)?,
                partner_key: var("WARUNG_SHOPEE_PARTNER_KEY").unwrap_or_default(),
            });
        }
        if let Some(key) = var("WARUNG_LAZADA_APP_KEY") {
            self.marketplace.lazada = Some(LazadaSettings {
                base_url: var("WARUNG_LAZADA_BASE_URL").unwrap_or_else(default_lazada_base_url),
                app_key: key,
                app_secret: var("WARUNG_LAZADA_APP_SECRET").unwrap_or_default(),
            });
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.enabled {
            if self.auth.jwt_secret.len() < 16 {
                return Err(ConfigError::Invalid(
                    "auth.jwt_secret must be at least 16 characters".into(),
                ));
            }
            if self.auth.jwt_secret == DEV_JWT_SECRET {
                warn!("Using the development JWT secret; set WARUNG_JWT_SECRET in production");
            }
        }
        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid("auth.token_lifetime_secs must be positive".into()));
        }

        if let Some(url) = &self.notification.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "notification.webhook_url must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        if self.marketplace.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "marketplace.refresh_interval_secs must be greater than 0".into(),
            ));
        }
        if let Some(shopee) = &self.marketplace.shopee {
            if shopee.partner_key.is_empty() {
                return Err(ConfigError::Invalid("marketplace.shopee.partner_key is required".into()));
            }
        }
        if let Some(lazada) = &self.marketplace.lazada {
            if lazada.app_secret.is_empty() {
                return Err(ConfigError::Invalid("marketplace.lazada.app_secret is required".into()));
            }
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.marketplace.refresh_interval_secs)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "warung", "pos")
            .map(|dirs| dirs.config_dir().join("warung.toml"))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}
