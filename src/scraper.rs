use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StorefrontConfig;
use crate::utils::error::SourceError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

// Must outlast the sleep between cycles or the DevTools connection is dropped.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

// Lower bound for waiting on the pincode input after the selector opens.
const MIN_INPUT_WAIT: Duration = Duration::from_secs(5);

/// A single long-lived headless Chrome instance and the tab it drives.
///
/// Launching Chrome is expensive, so one session is created at startup and
/// reused for every zone and cycle. `Tab` is not safe to drive from two
/// places at once; callers serialize access (see `RenderedPageSource`).
pub struct BrowserSession {
    // Kept alive for the tab; dropping it terminates the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
}

fn session_error(action: &'static str) -> impl Fn(anyhow::Error) -> SourceError {
    move |e| SourceError::Session(format!("{}: {}", action, e))
}

impl BrowserSession {
    pub fn launch(config: &StorefrontConfig) -> Result<Self, SourceError> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-background-timer-throttling"),
                OsStr::new("--disable-backgrounding-occluded-windows"),
                OsStr::new("--disable-renderer-backgrounding"),
            ])
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Session(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options).map_err(session_error("Failed to launch browser"))?;
        let tab = browser.new_tab().map_err(session_error("Failed to create tab"))?;
        tab.set_user_agent(USER_AGENT, None, None)
            .map_err(session_error("Failed to set user agent"))?;

        tracing::info!(headless = config.headless, "Rendering session started");
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    /// Select `zone` on the storefront, open the catalog page and return its
    /// rendered HTML. Blocks; run it off the async executor.
    pub fn load_catalog(&self, zone: &str, config: &StorefrontConfig) -> Result<String, SourceError> {
        let settle = Duration::from_millis(config.settle_delay_ms);

        self.open(&config.root_url, settle)?;
        self.select_zone(zone, config, settle)?;
        self.open(&config.catalog_url, settle)?;

        self.tab
            .get_content()
            .map_err(session_error("Failed to get page content"))
    }

    fn open(&self, url: &str, settle: Duration) -> Result<(), SourceError> {
        self.tab
            .navigate_to(url)
            .map_err(session_error("Navigation failed"))?
            .wait_until_navigated()
            .map_err(session_error("Page load failed"))?;
        // Product grids are filled in by client-side JS after load.
        std::thread::sleep(settle);
        Ok(())
    }

    fn select_zone(&self, zone: &str, config: &StorefrontConfig, settle: Duration) -> Result<(), SourceError> {
        let button = match self.tab.find_element(&config.zone_button_selector) {
            Ok(button) => button,
            Err(_) => {
                tracing::debug!(zone, "Zone selector not present, assuming zone is already set");
                return Ok(());
            }
        };

        button.click().map_err(session_error("Failed to open zone selector"))?;

        let input = self
            .tab
            .wait_for_element_with_custom_timeout(&config.zone_input_selector, settle.max(MIN_INPUT_WAIT))
            .map_err(|_| SourceError::ElementNotFound {
                selector: config.zone_input_selector.clone(),
            })?;

        input
            .click()
            .and_then(|input| input.type_into(zone))
            .map_err(session_error("Failed to enter zone code"))?;
        self.tab
            .press_key("Enter")
            .map_err(session_error("Failed to submit zone code"))?;

        std::thread::sleep(settle);
        tracing::debug!(zone, "Zone submitted");
        Ok(())
    }

    pub fn close(self) {
        if let Err(e) = self.tab.close(true) {
            tracing::warn!("Error closing browser tab: {}", e);
        }
        tracing::info!("Rendering session closed");
    }
}
