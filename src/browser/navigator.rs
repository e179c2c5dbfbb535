use super::session::BrowserError;
use headless_chrome::Tab;
use std::time::{Duration, Instant};

/// Criterion for deciding a page has loaded enough to extract data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Page reports loaded, `<body>` is present, and a short settle window
    /// has passed. Chrome's DevTools protocol exposes no in-flight request
    /// count, so this is the closest rendition of puppeteer's `networkidle2`.
    NetworkIdle,

    /// At least one DOM node matches the selector
    SelectorPresent(String),
}

/// Quiet window appended after the load event for `NetworkIdle`.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Polling cadence while waiting for a selector to appear.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drives a tab to a URL and blocks until a readiness condition holds.
///
/// No retry policy lives here; a timeout is reported as
/// [`BrowserError::Timeout`] so the orchestrator can decide whether another
/// attempt is worthwhile, while unrecoverable load failures (DNS, TLS,
/// protocol errors) surface as [`BrowserError::Navigation`].
pub struct PageNavigator {
    timeout: Duration,
}

impl PageNavigator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Navigate to an absolute http(s) URL and wait for `readiness`.
    pub fn navigate_and_wait(
        &self,
        tab: &Tab,
        url: &str,
        readiness: &Readiness,
    ) -> Result<(), BrowserError> {
        validate_url(url)?;

        log::debug!("Navigating to {}", url);

        tab.navigate_to(url)
            .map_err(|e| BrowserError::Navigation(format!("failed to navigate to {}: {}", url, e)))?;

        // navigate_to succeeded, so a load that never finishes from here on
        // is a readiness timeout rather than a hard navigation failure.
        tab.wait_until_navigated()
            .map_err(|e| BrowserError::Timeout(format!("page load of {}: {}", url, e)))?;

        match readiness {
            Readiness::NetworkIdle => {
                self.wait_for_selector(tab, "body")?;
                std::thread::sleep(SETTLE_DELAY);
            }
            Readiness::SelectorPresent(selector) => {
                self.wait_for_selector(tab, selector)?;
            }
        }

        Ok(())
    }

    /// Snapshot the rendered DOM as HTML. This is the only handoff to
    /// extraction; no live page references survive past it.
    pub fn page_html(&self, tab: &Tab) -> Result<String, BrowserError> {
        tab.get_content().map_err(|e| BrowserError::Page(e.to_string()))
    }

    /// Poll `document.querySelector` in the page context until the selector
    /// matches, bounded by the navigator's timeout.
    fn wait_for_selector(&self, tab: &Tab, selector: &str) -> Result<(), BrowserError> {
        let start = Instant::now();

        loop {
            if start.elapsed() > self.timeout {
                return Err(BrowserError::Timeout(format!(
                    "waiting for selector: {}",
                    selector
                )));
            }

            let script = format!(
                r#"document.querySelector('{}') !== null"#,
                selector.replace('\'', "\\'")
            );

            match tab.evaluate(&script, false) {
                Ok(result) => {
                    if let Some(value) = result.value {
                        if value.as_bool() == Some(true) {
                            return Ok(());
                        }
                    }
                }
                Err(_) => {
                    // Page context not ready yet, keep waiting
                }
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Navigation targets must be absolute http(s) URLs.
fn validate_url(url: &str) -> Result<(), BrowserError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(BrowserError::Navigation(format!(
            "not an absolute http(s) URL: {}",
            url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserConfig, BrowserSession};

    #[test]
    fn test_rejects_relative_url() {
        let err = validate_url("/cars").unwrap_err();
        assert!(matches!(err, BrowserError::Navigation(_)));
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("https://www.hertz.gr/en/car-rental/").is_ok());
    }

    #[test]
    #[ignore] // Requires Chrome/Chromium and internet
    fn test_navigate_and_snapshot() {
        let mut session = BrowserSession::acquire(&BrowserConfig::default()).unwrap();
        let navigator = PageNavigator::new(Duration::from_secs(30));

        navigator
            .navigate_and_wait(
                session.tab(),
                "https://example.com",
                &Readiness::SelectorPresent("h1".to_string()),
            )
            .unwrap();

        let html = navigator.page_html(session.tab()).unwrap();
        assert!(html.contains("Example"));

        session.release();
    }

    #[test]
    #[ignore] // Requires Chrome/Chromium and internet
    fn test_selector_wait_times_out() {
        let mut session = BrowserSession::acquire(&BrowserConfig::default()).unwrap();
        let navigator = PageNavigator::new(Duration::from_secs(3));

        let err = navigator
            .navigate_and_wait(
                session.tab(),
                "https://example.com",
                &Readiness::SelectorPresent("#no-such-element".to_string()),
            )
            .unwrap_err();

        assert!(matches!(err, BrowserError::Timeout(_)));
        session.release();
    }
}
