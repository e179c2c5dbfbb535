use super::config::BrowserConfig;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;

/// An isolated headless Chrome process with a single tab.
///
/// Acquiring a session consumes one OS process and socket; releasing it
/// terminates the process. `release` is idempotent and also runs on drop,
/// so an early `?` or a panic in the caller cannot leak the process.
pub struct BrowserSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launch a fresh browser process and open its scraping tab.
    pub fn acquire(config: &BrowserConfig) -> Result<Self, BrowserError> {
        // Owned argument strings must outlive the LaunchOptions borrow.
        let images_arg = config
            .disable_images
            .then(|| "--blink-settings=imagesEnabled=false".to_string());
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args: Vec<&OsStr> = vec![OsStr::new("--disable-dev-shm-usage")];
        if config.disable_sandbox {
            args.push(OsStr::new("--disable-setuid-sandbox"));
        }
        if let Some(ref img) = images_arg {
            args.push(OsStr::new(img));
        }
        if let Some(ref ua) = user_agent_arg {
            args.push(OsStr::new(ua));
        }

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(!config.disable_sandbox)
            .window_size(Some(config.window_size))
            .args(args)
            // Bounds the CDP handshake at startup; later stages keep the
            // connection busy through their own polling.
            .idle_browser_timeout(config.launch_timeout())
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| BrowserError::Launch(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        log::debug!("Browser session acquired");

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }

    /// The session's tab. Only meaningful while the session is live; after
    /// `release` any operation on it fails at the protocol level.
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Terminate the browser process. Safe to call more than once; only the
    /// first call has an effect.
    pub fn release(&mut self) {
        if self.browser.take().is_some() {
            log::debug!("Browser session released");
        }
    }

    /// Whether the underlying process has already been released.
    pub fn is_released(&self) -> bool {
        self.browser.is_none()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Errors from the browser layer
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timed out waiting for: {0}")]
    Timeout(String),

    #[error("page evaluation failed: {0}")]
    Page(String),
}
