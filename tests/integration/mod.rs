// Integration tests for QuickDeal Watcher
// These tests drive the monitor loop end to end with scripted sources and
// mocked HTTP endpoints.

pub mod search_api_tests;
pub mod telegram_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quickdeal_watcher::{
    config::{
        LoggingConfig, MetricsConfig, MonitorConfig, SearchApiConfig, StorefrontConfig,
        TelegramConfig,
    },
    core::{DiscountBand, NotificationComposer, ZoneDedupStore},
    models::{Deal, Zone},
    monitor::{DealMonitor, MonitorSettings},
    plugins::traits::{
        NotificationResult, NotifierPlugin, OutboundMessage, SourceKind, SourcePlugin,
    },
    utils::error::{DeliveryError, SourceError},
    AppConfig,
};

pub fn zone(code: &str) -> Zone {
    code.parse().expect("valid zone code")
}

pub fn deal(id: &str, discount: i64) -> Deal {
    Deal::new(
        id,
        &format!("Product {}", id),
        discount,
        &format!("https://www.jiomart.com/p/groceries/{}", id),
    )
    .expect("valid deal")
}

/// What a scripted source returns for one zone on one call.
#[derive(Debug, Clone)]
pub enum Script {
    Deals(Vec<Deal>),
    Fail,
}

/// Source that replays per-zone scripts. The last entry for a zone repeats
/// once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    scripts: Arc<Mutex<HashMap<Zone, Vec<Script>>>>,
    calls: Arc<Mutex<Vec<Zone>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, zone: &Zone, script: Vec<Script>) -> Self {
        self.scripts.lock().unwrap().insert(zone.clone(), script);
        self
    }

    pub fn with_deals(self, zone: &Zone, deals: Vec<Deal>) -> Self {
        self.with_script(zone, vec![Script::Deals(deals)])
    }

    pub fn calls(&self) -> Vec<Zone> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourcePlugin for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::StructuredQuery
    }

    async fn fetch(&self, zone: &Zone) -> Result<Vec<Deal>, SourceError> {
        self.calls.lock().unwrap().push(zone.clone());

        let mut scripts = self.scripts.lock().unwrap();
        let script = match scripts.get_mut(zone) {
            Some(script) if script.len() > 1 => script.remove(0),
            Some(script) => script.first().cloned().unwrap_or(Script::Deals(Vec::new())),
            None => Script::Deals(Vec::new()),
        };

        match script {
            Script::Deals(deals) => Ok(deals),
            Script::Fail => Err(SourceError::Status { status: 503 }),
        }
    }
}

/// Notifier that records every message, optionally failing all of them.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages_for(&self, zone: &Zone) -> Vec<String> {
        let marker = format!("`{}`", zone);
        self.messages()
            .into_iter()
            .filter(|m| m.contains(&marker))
            .collect()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn plugin_type(&self) -> &str {
        "recording"
    }

    async fn notify(&self, message: &OutboundMessage) -> Result<NotificationResult, DeliveryError> {
        self.sent.lock().unwrap().push(message.text.clone());
        if self.fail {
            return Err(DeliveryError::Rejected {
                status: 502,
                body: "Bad Gateway".to_string(),
            });
        }
        Ok(NotificationResult {
            parts_sent: 1,
            message_ids: vec![self.sent.lock().unwrap().len() as i64],
        })
    }
}

pub fn build_monitor(
    source: ScriptedSource,
    notifier: RecordingNotifier,
    zones: &[Zone],
    store: ZoneDedupStore,
) -> DealMonitor {
    DealMonitor::new(
        Box::new(source),
        Box::new(notifier),
        NotificationComposer::default(),
        store,
        MonitorSettings {
            zones: zones.to_vec(),
            band: DiscountBand::default(),
            interval: Duration::from_millis(5),
        },
    )
}

/// Test configuration pointing both HTTP endpoints at `base_url`.
pub fn get_test_config(base_url: &str, zones: &[&str]) -> AppConfig {
    AppConfig {
        telegram: TelegramConfig {
            bot_token: "123456:TEST-TOKEN".to_string(),
            chat_id: "-1001234567890".to_string(),
            api_base: base_url.to_string(),
            header: "🔥 *JioMart QUICK Deals*".to_string(),
            request_timeout_secs: 2,
        },
        monitor: MonitorConfig {
            zones: zones.iter().map(|z| zone(z)).collect(),
            source: SourceKind::StructuredQuery,
            min_discount: 70,
            max_discount: 99,
            poll_interval_secs: Some(1),
        },
        search_api: SearchApiConfig {
            endpoint: format!("{}/api/search", base_url),
            request_timeout_secs: 2,
            ..SearchApiConfig::default()
        },
        storefront: StorefrontConfig::default(),
        logging: LoggingConfig::default(),
        metrics: MetricsConfig::default(),
    }
}

/// Search API product JSON in the shape the endpoint returns.
pub fn product_json(id: &str, name: &str, discount: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "displayName": name,
        "discount": discount,
        "mrp": 200,
        "sellingPrice": 200 - 2 * discount,
        "seoUrl": format!("/groceries/{}", id),
    })
}
