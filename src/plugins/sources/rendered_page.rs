use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::config::StorefrontConfig;
use crate::element_finder::CardExtractor;
use crate::models::{Deal, Zone};
use crate::plugins::traits::{SourceKind, SourcePlugin};
use crate::scraper::BrowserSession;
use crate::utils::error::{AppError, SourceError};

/// Scrapes the rendered quick-delivery catalog through a headless browser.
///
/// Owns the only rendering session in the process. All browser work runs on
/// the blocking pool while holding the session lock, so zones never share
/// the tab concurrently.
pub struct RenderedPageSource {
    session: Arc<Mutex<Option<BrowserSession>>>,
    extractor: CardExtractor,
    config: StorefrontConfig,
}

impl RenderedPageSource {
    pub fn launch(config: StorefrontConfig) -> Result<Self, AppError> {
        let extractor = CardExtractor::new(&config)?;
        let session = BrowserSession::launch(&config)?;

        Ok(Self {
            session: Arc::new(Mutex::new(Some(session))),
            extractor,
            config,
        })
    }
}

#[async_trait]
impl SourcePlugin for RenderedPageSource {
    fn name(&self) -> &str {
        "JioMart storefront (headless Chrome)"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::RenderedPage
    }

    async fn fetch(&self, zone: &Zone) -> Result<Vec<Deal>, SourceError> {
        let session = Arc::clone(&self.session);
        let config = self.config.clone();
        let zone_code = zone.to_string();

        let html = tokio::task::spawn_blocking(move || {
            let guard = session
                .lock()
                .map_err(|_| SourceError::Session("rendering session lock poisoned".to_string()))?;
            let session = guard
                .as_ref()
                .ok_or_else(|| SourceError::Session("rendering session already closed".to_string()))?;
            session.load_catalog(&zone_code, &config)
        })
        .await
        .map_err(|e| SourceError::Session(format!("browser task failed: {}", e)))??;

        let deals = self.extractor.extract(&html);
        tracing::debug!(zone = %zone, count = deals.len(), "Storefront page yielded deals");
        Ok(deals)
    }

    async fn shutdown(&self) -> Result<(), SourceError> {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|_| SourceError::Session("rendering session lock poisoned".to_string()))?;
            if let Some(session) = guard.take() {
                session.close();
            }
            Ok::<(), SourceError>(())
        })
        .await
        .map_err(|e| SourceError::Session(format!("browser task failed: {}", e)))?
    }
}
