use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, Map};
use scraper::Selector;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::core::composer::DEFAULT_HEADER;
use crate::core::filter::{DEFAULT_MAX_DISCOUNT, DEFAULT_MIN_DISCOUNT};
use crate::core::DiscountBand;
use crate::models::Zone;
use crate::plugins::traits::SourceKind;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub telegram: TelegramConfig,
    #[validate(nested)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    #[validate(nested)]
    pub search_api: SearchApiConfig,
    #[serde(default)]
    #[validate(nested)]
    pub storefront: StorefrontConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelegramConfig {
    #[validate(length(min = 1, message = "Telegram bot_token must not be empty"))]
    pub bot_token: String,
    #[validate(length(min = 1, message = "Telegram chat_id must not be empty"))]
    pub chat_id: String,
    #[serde(default = "default_telegram_api_base")]
    #[validate(url)]
    pub api_base: String,
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default = "default_telegram_timeout_secs")]
    #[validate(range(min = 1, message = "telegram.request_timeout_secs must be greater than 0"))]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorConfig {
    /// Checked in this order every cycle.
    #[validate(length(min = 1, message = "At least one zone must be configured"))]
    #[serde(deserialize_with = "deserialize_zones")]
    pub zones: Vec<Zone>,
    #[serde(default = "default_source_kind")]
    pub source: SourceKind,
    #[serde(default = "default_min_discount")]
    pub min_discount: u8,
    #[serde(default = "default_max_discount")]
    pub max_discount: u8,
    /// Falls back to the source's default when unset.
    #[validate(range(min = 1, message = "poll_interval_secs must be greater than 0"))]
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SearchApiConfig {
    #[validate(url)]
    pub endpoint: String,
    #[validate(url)]
    pub product_url_prefix: String,
    pub serviceability_tag: String,
    #[validate(range(min = 1, max = 500))]
    pub rows: u32,
    pub sort: String,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorefrontConfig {
    #[validate(url)]
    pub root_url: String,
    #[validate(url)]
    pub catalog_url: String,
    pub zone_button_selector: String,
    pub zone_input_selector: String,
    pub card_selector: String,
    pub name_selector: String,
    pub link_selector: String,
    pub settle_delay_ms: u64,
    pub chrome_path: Option<String>,
    pub headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Also write a daily-rolling log file here when set.
    pub directory: Option<String>,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Zones arrive as a list from files and as one comma-separated string from
/// `QUICKDEAL__MONITOR__ZONES`. Codes stay strings so leading zeros survive.
fn deserialize_zones<'de, D>(deserializer: D) -> Result<Vec<Zone>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ZoneList {
        List(Vec<Zone>),
        Joined(String),
    }

    match ZoneList::deserialize(deserializer)? {
        ZoneList::List(zones) => Ok(zones),
        ZoneList::Joined(joined) => joined
            .split(',')
            .filter(|code| !code.trim().is_empty())
            .map(|code| code.parse().map_err(de::Error::custom))
            .collect(),
    }
}

fn default_telegram_timeout_secs() -> u64 {
    15
}

fn default_header() -> String {
    DEFAULT_HEADER.to_string()
}

fn default_source_kind() -> SourceKind {
    SourceKind::StructuredQuery
}

fn default_min_discount() -> u8 {
    DEFAULT_MIN_DISCOUNT
}

fn default_max_discount() -> u8 {
    DEFAULT_MAX_DISCOUNT
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.jiomart.com/api/search".to_string(),
            product_url_prefix: "https://www.jiomart.com/p/".to_string(),
            serviceability_tag: "JIOMART_QUICK".to_string(),
            rows: 50,
            sort: "discount_desc".to_string(),
            request_timeout_secs: 15,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            root_url: "https://www.jiomart.com/".to_string(),
            catalog_url: "https://www.jiomart.com/c/quick".to_string(),
            zone_button_selector: "#btn_pin_code_delivery".to_string(),
            zone_input_selector: "#rel_pincode".to_string(),
            card_selector: "li.ais-InfiniteHits-item".to_string(),
            name_selector: ".plp-card-details-name".to_string(),
            link_selector: "a[href]".to_string(),
            settle_delay_ms: 5000,
            chrome_path: None,
            headless: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "quickdeal_watcher=info".to_string(),
            directory: None,
            file_prefix: "quickdeal-watcher.log".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9001,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_secs
                .unwrap_or_else(|| self.source.default_poll_interval_secs()),
        )
    }

    pub fn discount_band(&self) -> Option<DiscountBand> {
        DiscountBand::new(self.min_discount, self.max_discount)
    }
}

impl AppConfig {
    /// Load configuration from `.env`-style bare variables, the `config/`
    /// directory, an optional extra file and `QUICKDEAL__*` variables, in
    /// increasing priority.
    pub fn from_env(extra_file: Option<&Path>) -> Result<Self, ConfigError> {
        let vars: Map<String, String> = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self::from_vars(extra_file, vars)
    }

    /// [`AppConfig::from_env`] against an explicit variable set instead of
    /// the process environment.
    pub fn from_vars(extra_file: Option<&Path>, vars: Map<String, String>) -> Result<Self, ConfigError> {
        let run_mode = vars
            .get("RUN_MODE")
            .cloned()
            .unwrap_or_else(|| "development".into());

        let mut builder = Config::builder();

        // Bare variables from existing .env deployments
        for (var, key) in [
            ("BOT_TOKEN", "telegram.bot_token"),
            ("CHAT_ID", "telegram.chat_id"),
            ("CHROME_PATH", "storefront.chrome_path"),
        ] {
            if let Some(value) = vars.get(var) {
                builder = builder.set_default(key, value.as_str())?;
            }
        }

        builder = builder
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("QUICKDEAL")
                .separator("__")
                .source(Some(vars)),
        );

        Self::from_builder(builder)
    }

    /// Build, deserialize and validate.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Validate::validate(self).map_err(|e| ConfigError::Message(e.to_string()))?;

        if self.monitor.discount_band().is_none() {
            return Err(ConfigError::Message(format!(
                "Discount band {}..={} is invalid: min must not exceed max and max must be at most 100",
                self.monitor.min_discount, self.monitor.max_discount
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for zone in &self.monitor.zones {
            if !seen.insert(zone) {
                return Err(ConfigError::Message(format!("Zone {} is configured twice", zone)));
            }
        }

        if self.monitor.source == SourceKind::RenderedPage {
            let storefront = &self.storefront;
            for (field, selector) in [
                ("zone_button_selector", &storefront.zone_button_selector),
                ("zone_input_selector", &storefront.zone_input_selector),
                ("card_selector", &storefront.card_selector),
                ("name_selector", &storefront.name_selector),
                ("link_selector", &storefront.link_selector),
            ] {
                if Selector::parse(selector).is_err() {
                    return Err(ConfigError::Message(format!(
                        "Invalid CSS selector in storefront.{}: {}",
                        field, selector
                    )));
                }
            }
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }
}
