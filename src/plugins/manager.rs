use super::notifiers::TelegramNotifier;
use super::sources::{RenderedPageSource, StructuredQuerySource};
use super::traits::{NotifierPlugin, SourceKind, SourcePlugin};
use crate::config::AppConfig;
use crate::utils::error::AppError;

pub type SourcePluginBox = Box<dyn SourcePlugin>;
pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Builds the source and notifier selected by configuration.
pub struct PluginManager;

impl PluginManager {
    /// Create the configured deal source. For the browser variant this
    /// launches Chrome, so call it once per process.
    pub fn create_source(config: &AppConfig) -> Result<SourcePluginBox, AppError> {
        let source: SourcePluginBox = match config.monitor.source {
            SourceKind::StructuredQuery => {
                Box::new(StructuredQuerySource::new(config.search_api.clone())?)
            }
            SourceKind::RenderedPage => Box::new(RenderedPageSource::launch(config.storefront.clone())?),
        };

        tracing::info!(source = source.name(), "Deal source ready");
        Ok(source)
    }

    pub fn create_notifier(config: &AppConfig) -> Result<NotifierPluginBox, AppError> {
        let notifier = TelegramNotifier::new(config.telegram.clone())?;
        tracing::info!(notifier = notifier.name(), "Notifier ready");
        Ok(Box::new(notifier))
    }
}
