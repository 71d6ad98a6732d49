pub mod config;
pub mod core;
pub mod element_finder;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod plugins;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use monitor::{CycleReport, DealMonitor, MonitorSettings, ZoneOutcome};
pub use utils::error::AppError;
