use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::core::{DiscountBand, NotificationComposer, ZoneDedupStore};
use crate::models::Zone;
use crate::plugins::traits::{NotifierPlugin, OutboundMessage, SourcePlugin};

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub zones: Vec<Zone>,
    pub band: DiscountBand,
    pub interval: Duration,
}

impl MonitorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            zones: config.monitor.zones.clone(),
            band: config.monitor.discount_band().unwrap_or_default(),
            interval: config.monitor.poll_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ZoneOutcome {
    Notified(usize),
    NoNewDeals,
    SourceFailed(String),
    DeliveryFailed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    pub zone: Zone,
    pub fetched: usize,
    pub qualifying: usize,
    /// Ids in this cycle's batch, whether or not delivery succeeded.
    pub new_ids: Vec<String>,
    pub outcome: ZoneOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub zones: Vec<ZoneReport>,
}

impl CycleReport {
    pub fn zone(&self, zone: &Zone) -> Option<&ZoneReport> {
        self.zones.iter().find(|r| &r.zone == zone)
    }

    pub fn notified(&self) -> usize {
        self.zones
            .iter()
            .map(|r| match r.outcome {
                ZoneOutcome::Notified(n) => n,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.zones
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    ZoneOutcome::SourceFailed(_) | ZoneOutcome::DeliveryFailed(_)
                )
            })
            .count()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorStats {
    pub cycles: u64,
    pub deals_fetched: u64,
    pub deals_notified: u64,
    pub source_failures: u64,
    pub delivery_failures: u64,
}

/// The polling loop: for every zone, fetch, filter, dedup, compose and
/// notify, then sleep and go again.
///
/// Zones are handled one at a time in configured order, and the dedup store
/// is only reached through `&mut self`, so check-then-mark for a zone is never
/// interleaved with another zone. A failing zone is logged and skipped; it
/// never stops the loop.
pub struct DealMonitor {
    source: Box<dyn SourcePlugin>,
    notifier: Box<dyn NotifierPlugin>,
    composer: NotificationComposer,
    store: ZoneDedupStore,
    settings: MonitorSettings,
    stats: MonitorStats,
}

impl DealMonitor {
    pub fn new(
        source: Box<dyn SourcePlugin>,
        notifier: Box<dyn NotifierPlugin>,
        composer: NotificationComposer,
        store: ZoneDedupStore,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            notifier,
            composer,
            store,
            settings,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn store(&self) -> &ZoneDedupStore {
        &self.store
    }

    /// Run cycles until `shutdown` resolves. An in-flight cycle is abandoned
    /// at its next suspension point.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            zones = self.settings.zones.len(),
            min = self.settings.band.min(),
            max = self.settings.band.max(),
            interval_secs = self.settings.interval.as_secs(),
            "Monitoring quick deals"
        );

        loop {
            let report = tokio::select! {
                _ = &mut shutdown => break,
                report = self.run_cycle() => report,
            };

            tracing::info!(
                cycle = report.cycle,
                notified = report.notified(),
                failures = report.failures(),
                elapsed_ms = report.elapsed_ms,
                "Cycle complete"
            );

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        tracing::info!(cycles = self.stats.cycles, "Monitor loop stopped");
    }

    /// Process every configured zone once.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started_at = Utc::now();
        let start_time = Instant::now();
        self.stats.cycles += 1;
        metrics::counter!("quickdeal_cycles_total").increment(1);

        let zones = self.settings.zones.clone();
        let mut reports = Vec::with_capacity(zones.len());
        for zone in &zones {
            reports.push(self.process_zone(zone).await);
        }

        CycleReport {
            cycle: self.stats.cycles,
            started_at,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            zones: reports,
        }
    }

    async fn process_zone(&mut self, zone: &Zone) -> ZoneReport {
        let fetched = match self.source.fetch(zone).await {
            Ok(deals) => deals,
            Err(e) => {
                tracing::warn!(zone = %zone, error = %e, "Fetch failed, skipping zone this cycle");
                self.stats.source_failures += 1;
                metrics::counter!("quickdeal_source_failures_total", "zone" => zone.to_string()).increment(1);
                return ZoneReport {
                    zone: zone.clone(),
                    fetched: 0,
                    qualifying: 0,
                    new_ids: Vec::new(),
                    outcome: ZoneOutcome::SourceFailed(e.to_string()),
                };
            }
        };

        let fetched_count = fetched.len();
        self.stats.deals_fetched += fetched_count as u64;
        metrics::counter!("quickdeal_deals_fetched_total", "zone" => zone.to_string())
            .increment(fetched_count as u64);

        let candidates = self.settings.band.apply(fetched);
        let qualifying = candidates.len();
        let new_deals = self.store.retain_new(zone, candidates);
        let new_ids: Vec<String> = new_deals.iter().map(|d| d.id().to_string()).collect();

        tracing::debug!(
            zone = %zone,
            fetched = fetched_count,
            qualifying,
            new = new_deals.len(),
            "Zone processed"
        );

        let outcome = match self.composer.compose(zone, &new_deals) {
            None => ZoneOutcome::NoNewDeals,
            Some(text) => match self.notifier.notify(&OutboundMessage::markdown(text)).await {
                Ok(result) => {
                    tracing::info!(
                        zone = %zone,
                        deals = new_deals.len(),
                        parts = result.parts_sent,
                        "Grouped alert sent"
                    );
                    self.stats.deals_notified += new_deals.len() as u64;
                    metrics::counter!("quickdeal_deals_notified_total", "zone" => zone.to_string())
                        .increment(new_deals.len() as u64);
                    ZoneOutcome::Notified(new_deals.len())
                }
                Err(e) => {
                    // The ids stay marked; this batch is dropped, not retried.
                    tracing::error!(zone = %zone, deals = new_deals.len(), error = %e, "Alert delivery failed");
                    self.stats.delivery_failures += 1;
                    metrics::counter!("quickdeal_delivery_failures_total", "zone" => zone.to_string())
                        .increment(1);
                    ZoneOutcome::DeliveryFailed(e.to_string())
                }
            },
        };

        ZoneReport {
            zone: zone.clone(),
            fetched: fetched_count,
            qualifying,
            new_ids,
            outcome,
        }
    }

    /// Release the source (closes the browser, if any) and the notifier.
    pub async fn shutdown(&self) {
        if let Err(e) = self.source.shutdown().await {
            tracing::warn!("Error shutting down deal source: {}", e);
        }
        if let Err(e) = self.notifier.shutdown().await {
            tracing::warn!("Error shutting down notifier: {}", e);
        }
    }
}
