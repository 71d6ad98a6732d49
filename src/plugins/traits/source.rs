use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Deal, Zone};
use crate::utils::error::SourceError;

/// Which way deals are obtained from the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum SourceKind {
    /// Direct JSON search endpoint.
    #[serde(rename = "api")]
    #[value(name = "api")]
    StructuredQuery,
    /// Headless browser scrape of the rendered catalog page.
    #[serde(rename = "browser")]
    #[value(name = "browser")]
    RenderedPage,
}

impl SourceKind {
    /// Default poll interval; the browser variant is slower and heavier on
    /// the site so it polls less often.
    pub fn default_poll_interval_secs(&self) -> u64 {
        match self {
            SourceKind::StructuredQuery => 600,
            SourceKind::RenderedPage => 1800,
        }
    }
}

/// Trait for implementing deal sources (search API, rendered page, etc.)
#[async_trait]
pub trait SourcePlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn kind(&self) -> SourceKind;

    /// Fetch every usable deal currently listed for `zone`. Records that fail
    /// validation are dropped, never returned half-filled.
    async fn fetch(&self, zone: &Zone) -> Result<Vec<Deal>, SourceError>;

    /// Plugin lifecycle
    async fn shutdown(&self) -> Result<(), SourceError> {
        Ok(())
    }
}
