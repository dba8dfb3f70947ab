//! # Register Configuration
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file (`register.toml` in the platform config dir, or `--config`)
//! 3. Environment variables (`MASALA_*`)
//!
//! ## Example Config File
//! ```toml
//! [api]
//! base_url = "https://pos.example.com/api"
//! token = "..."
//! timeout_secs = 15
//! catalog_retry_secs = 30
//!
//! [billing]
//! tax_rate_bps = 1800
//!
//! [business]
//! name = "Masala House"
//! address_lines = ["12 MG Road", "Bengaluru 560001"]
//! phone = "080-4000 1234"
//! tax_id = "29ABCDE1234F1Z5"
//! currency_symbol = "₹"
//!
//! [receipt]
//! paper_width = 42
//! fallback_dir = "/var/spool/masala/receipts"
//!
//! [storage]
//! database_path = "/var/lib/masala/register.db"
//! ```
//!
//! Read-only after startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use masala_client::ClientConfig;
use masala_core::receipt::{MAX_PAPER_WIDTH, MIN_PAPER_WIDTH};
use masala_core::validation::validate_tax_rate_bps;
use masala_core::{BusinessInfo, TaxRate, DEFAULT_TAX_RATE};

use crate::error::ConfigError;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "register.toml";

// =============================================================================
// Sections
// =============================================================================

/// `[api]`: the restaurant REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Total time spent retrying a failed catalog refresh.
    pub catalog_retry_secs: u64,
    /// First retry delay for catalog refresh.
    pub catalog_initial_backoff_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            token: None,
            timeout_secs: 15,
            catalog_retry_secs: 30,
            catalog_initial_backoff_ms: 500,
        }
    }
}

/// `[billing]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    /// e.g. 1800 = 18%
    pub tax_rate_bps: u32,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            tax_rate_bps: DEFAULT_TAX_RATE.bps(),
        }
    }
}

/// `[receipt]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptSettings {
    /// Characters per line (32 for 58 mm paper, 42 or 48 for 80 mm).
    pub paper_width: usize,
    /// Where printable HTML receipts go when no printer is online.
    pub fallback_dir: Option<PathBuf>,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        Self {
            paper_width: 42,
            fallback_dir: None,
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub billing: BillingSettings,

    /// Receipt header and footer.
    #[serde(default)]
    pub business: BusinessInfo,

    #[serde(default)]
    pub receipt: ReceiptSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::Invalid(format!("api.base_url '{}': {}", self.api.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        validate_tax_rate_bps(self.billing.tax_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !(MIN_PAPER_WIDTH..=MAX_PAPER_WIDTH).contains(&self.receipt.paper_width) {
            return Err(ConfigError::Invalid(format!(
                "receipt.paper_width must be between {} and {}",
                MIN_PAPER_WIDTH, MAX_PAPER_WIDTH
            )));
        }

        Ok(())
    }

    /// Applies `MASALA_*` overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `MASALA_API_URL`, `MASALA_API_TOKEN`, `MASALA_API_TIMEOUT_SECS`
    /// - `MASALA_TAX_RATE`: percentage, e.g. "18" or "8.25"
    /// - `MASALA_BUSINESS_NAME`
    /// - `MASALA_PAPER_WIDTH`, `MASALA_RECEIPT_DIR`
    /// - `MASALA_DB_PATH`
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("MASALA_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(token) = lookup("MASALA_API_TOKEN") {
            self.api.token = Some(token);
        }

        if let Some(secs) = lookup("MASALA_API_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid MASALA_API_TIMEOUT_SECS"),
            }
        }

        if let Some(rate) = lookup("MASALA_TAX_RATE") {
            match rate.parse::<f64>() {
                Ok(r) if r.is_finite() && r >= 0.0 => {
                    self.billing.tax_rate_bps = (r * 100.0).round() as u32;
                }
                _ => warn!(value = %rate, "Ignoring invalid MASALA_TAX_RATE"),
            }
        }

        if let Some(name) = lookup("MASALA_BUSINESS_NAME") {
            self.business.name = name;
        }

        if let Some(width) = lookup("MASALA_PAPER_WIDTH") {
            match width.parse::<usize>() {
                Ok(w) => self.receipt.paper_width = w,
                Err(_) => warn!(value = %width, "Ignoring invalid MASALA_PAPER_WIDTH"),
            }
        }

        if let Some(dir) = lookup("MASALA_RECEIPT_DIR") {
            self.receipt.fallback_dir = Some(PathBuf::from(dir));
        }

        if let Some(path) = lookup("MASALA_DB_PATH") {
            self.storage.database_path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "masala", "register")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.billing.tax_rate_bps)
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.api.base_url.clone())
            .with_timeout(Duration::from_secs(self.api.timeout_secs));
        if let Some(token) = &self.api.token {
            config = config.with_token(token.clone());
        }
        config
    }

    /// Configured database path, else `masala.db` in the platform data dir,
    /// else the working directory.
    pub fn database_path(&self) -> PathBuf {
        self.storage.database_path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("masala.db"))
                .unwrap_or_else(|| PathBuf::from("masala.db"))
        })
    }

    /// Directory for fallback HTML receipts.
    pub fn receipt_dir(&self) -> PathBuf {
        self.receipt.fallback_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("receipts"))
                .unwrap_or_else(|| PathBuf::from("receipts"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = RegisterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tax_rate(), TaxRate::from_bps(1800));
        assert_eq!(config.business.currency_symbol, "₹");
    }

    #[test]
    fn test_toml_sections() {
        let config: RegisterConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://pos.example.com/api"
            token = "abc"

            [billing]
            tax_rate_bps = 500

            [business]
            name = "Dosa Corner"
            address_lines = ["1 Beach Road"]

            [receipt]
            paper_width = 32
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://pos.example.com/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.billing.tax_rate_bps, 500);
        assert_eq!(config.business.name, "Dosa Corner");
        assert_eq!(config.business.footer, BusinessInfo::default().footer);
        assert_eq!(config.receipt.paper_width, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MASALA_API_URL", "https://api.example.com"),
            ("MASALA_TAX_RATE", "8.25"),
            ("MASALA_API_TIMEOUT_SECS", "soon"),
            ("MASALA_DB_PATH", "/tmp/masala.db"),
        ]
        .into_iter()
        .collect();

        let mut config = RegisterConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.billing.tax_rate_bps, 825);
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/masala.db"));
    }

    #[test]
    fn test_validation() {
        let mut config = RegisterConfig::default();
        config.api.base_url = "ws://localhost:5000".into();
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.billing.tax_rate_bps = 10_001;
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.receipt.paper_width = 20;
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[billing]\ntax_rate_bps = 1200\n").unwrap();

        let config = RegisterConfig::from_file(&path).unwrap();
        assert_eq!(config.billing.tax_rate_bps, 1200);

        std::fs::write(&path, "[billing\n").unwrap();
        assert!(matches!(
            RegisterConfig::from_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
