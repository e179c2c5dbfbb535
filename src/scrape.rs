//! Scrape orchestration
//!
//! One idempotent operation: [`Scraper::scrape_listings`] acquires an
//! isolated browser session, navigates to the target, waits for readiness,
//! snapshots the DOM, extracts listings, and releases the session — on every
//! exit path. Transient failures (launch, readiness timeout) retry with a
//! full teardown and a fresh session; everything else surfaces immediately.

use crate::browser::{BrowserConfig, BrowserError, BrowserSession, PageNavigator, Readiness};
use crate::extract::{extract_listings, ExtractError, ExtractionSchema};
use crate::models::Listing;
use std::time::Duration;

/// Failure taxonomy surfaced to the caller. An empty catalog is not a
/// failure; it comes back as `Ok(vec![])`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScrapeError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("extraction failed: {0}")]
    Extraction(String),
}

impl ScrapeError {
    /// Only launch failures and readiness timeouts are worth another
    /// attempt; hard navigation failures and schema errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScrapeError::Launch(_) | ScrapeError::NavigationTimeout(_))
    }
}

impl From<BrowserError> for ScrapeError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::Launch(m) => ScrapeError::Launch(m),
            BrowserError::Timeout(m) => ScrapeError::NavigationTimeout(m),
            BrowserError::Navigation(m) => ScrapeError::Navigation(m),
            BrowserError::Page(m) => ScrapeError::Extraction(m),
        }
    }
}

impl From<ExtractError> for ScrapeError {
    fn from(e: ExtractError) -> Self {
        ScrapeError::Extraction(e.to_string())
    }
}

/// What to scrape and how patient to be about it
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    pub url: String,
    pub readiness: Readiness,
    pub schema: ExtractionSchema,
    pub navigation_timeout: Duration,
    /// Extra attempts after the first, applied only to retryable failures
    pub max_retries: u32,
}

/// Seam between the orchestrator and the browser, so retry and
/// release-exactly-once behavior can be exercised without Chrome.
pub trait ScrapeDriver {
    type Session;

    /// Launch a fresh, isolated session. Never reuses a prior one.
    fn acquire(&self) -> Result<Self::Session, ScrapeError>;

    /// Navigate, wait for readiness, and return a DOM snapshot.
    fn fetch(&self, session: &mut Self::Session, target: &ScrapeTarget)
        -> Result<String, ScrapeError>;

    /// Tear the session down. Must tolerate being called on a session whose
    /// fetch failed.
    fn release(&self, session: &mut Self::Session);
}

/// Production driver over headless Chrome
pub struct ChromeDriver {
    config: BrowserConfig,
}

impl ChromeDriver {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

impl ScrapeDriver for ChromeDriver {
    type Session = BrowserSession;

    fn acquire(&self) -> Result<BrowserSession, ScrapeError> {
        BrowserSession::acquire(&self.config).map_err(Into::into)
    }

    fn fetch(
        &self,
        session: &mut BrowserSession,
        target: &ScrapeTarget,
    ) -> Result<String, ScrapeError> {
        let navigator = PageNavigator::new(target.navigation_timeout);
        navigator.navigate_and_wait(session.tab(), &target.url, &target.readiness)?;
        navigator.page_html(session.tab()).map_err(Into::into)
    }

    fn release(&self, session: &mut BrowserSession) {
        session.release();
    }
}

/// The scrape orchestrator. Stateless between calls: two invocations are two
/// independent full scrapes with their own sessions.
pub struct Scraper<D: ScrapeDriver> {
    driver: D,
    target: ScrapeTarget,
}

impl<D: ScrapeDriver> Scraper<D> {
    pub fn new(driver: D, target: ScrapeTarget) -> Self {
        Self { driver, target }
    }

    /// Run one full scrape, retrying transient failures up to
    /// `max_retries` times with a fresh session per attempt.
    pub fn scrape_listings(&self) -> Result<Vec<Listing>, ScrapeError> {
        let mut attempt: u32 = 0;

        loop {
            match self.scrape_once() {
                Ok(listings) => {
                    log::info!("Scraped {} listings from {}", listings.len(), self.target.url);
                    return Ok(listings);
                }
                Err(e) if e.is_retryable() && attempt < self.target.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "Scrape attempt {} of {} failed ({}), retrying with a fresh session",
                        attempt,
                        self.target.max_retries + 1,
                        e
                    );
                }
                Err(e) => {
                    log::error!("Scrape of {} failed: {}", self.target.url, e);
                    return Err(e);
                }
            }
        }
    }

    /// Launching -> Navigating -> Extracting -> Closing. The session
    /// acquired here is released before any error leaves this function.
    fn scrape_once(&self) -> Result<Vec<Listing>, ScrapeError> {
        let mut session = self.driver.acquire()?;

        let result = self
            .driver
            .fetch(&mut session, &self.target)
            .and_then(|html| extract_listings(&html, &self.target.schema).map_err(Into::into));

        self.driver.release(&mut session);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldRule;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    const FIXTURE: &str = r#"
        <div class="vehicle">
            <h3 class="vehicle-title">Fiat Panda</h3>
            <span class="vehicle-price">€29/day</span>
        </div>
        <div class="vehicle">
            <h3 class="vehicle-title">VW Golf</h3>
        </div>
    "#;

    fn target(max_retries: u32) -> ScrapeTarget {
        ScrapeTarget {
            url: "https://rentals.example.com/fleet".to_string(),
            readiness: Readiness::SelectorPresent(".vehicle".to_string()),
            schema: ExtractionSchema {
                root: ".vehicle".to_string(),
                name: FieldRule::text(".vehicle-title"),
                price: Some(FieldRule::text(".vehicle-price")),
                image: None,
                link: None,
            },
            navigation_timeout: Duration::from_secs(5),
            max_retries,
        }
    }

    #[derive(Default)]
    struct DriverLog {
        acquired: usize,
        released_ids: Vec<usize>,
        fetched_ids: Vec<usize>,
    }

    struct FakeSession {
        id: usize,
        released: bool,
    }

    /// Scripted driver: each fetch consumes the next outcome.
    struct FakeDriver {
        outcomes: RefCell<VecDeque<Result<String, ScrapeError>>>,
        log: Rc<RefCell<DriverLog>>,
    }

    impl FakeDriver {
        fn new(outcomes: Vec<Result<String, ScrapeError>>) -> (Self, Rc<RefCell<DriverLog>>) {
            let log = Rc::new(RefCell::new(DriverLog::default()));
            (
                Self {
                    outcomes: RefCell::new(outcomes.into()),
                    log: Rc::clone(&log),
                },
                log,
            )
        }
    }

    impl ScrapeDriver for FakeDriver {
        type Session = FakeSession;

        fn acquire(&self) -> Result<FakeSession, ScrapeError> {
            let mut log = self.log.borrow_mut();
            log.acquired += 1;
            Ok(FakeSession {
                id: log.acquired,
                released: false,
            })
        }

        fn fetch(
            &self,
            session: &mut FakeSession,
            _target: &ScrapeTarget,
        ) -> Result<String, ScrapeError> {
            assert!(!session.released, "fetch on a released session");
            self.log.borrow_mut().fetched_ids.push(session.id);
            self.outcomes
                .borrow_mut()
                .pop_front()
                .expect("unscripted fetch")
        }

        fn release(&self, session: &mut FakeSession) {
            assert!(!session.released, "double release");
            session.released = true;
            self.log.borrow_mut().released_ids.push(session.id);
        }
    }

    #[test]
    fn test_successful_scrape_releases_once() {
        let (driver, log) = FakeDriver::new(vec![Ok(FIXTURE.to_string())]);
        let scraper = Scraper::new(driver, target(2));

        let listings = scraper.scrape_listings().unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "Fiat Panda");
        assert_eq!(listings[0].price.as_deref(), Some("€29/day"));
        assert_eq!(listings[1].name, "VW Golf");
        assert_eq!(listings[1].price, None);

        let log = log.borrow();
        assert_eq!(log.acquired, 1);
        assert_eq!(log.released_ids, vec![1]);
    }

    #[test]
    fn test_timeout_retries_with_fresh_sessions() {
        let timeout = || Err(ScrapeError::NavigationTimeout("readiness unmet".to_string()));
        let (driver, log) = FakeDriver::new(vec![timeout(), timeout(), timeout()]);
        let scraper = Scraper::new(driver, target(2));

        let err = scraper.scrape_listings().unwrap_err();
        assert!(matches!(err, ScrapeError::NavigationTimeout(_)));

        // Exactly 3 attempts, 3 distinct sessions, each released once.
        let log = log.borrow();
        assert_eq!(log.acquired, 3);
        assert_eq!(log.fetched_ids, vec![1, 2, 3]);
        assert_eq!(log.released_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_retry_then_success() {
        let (driver, log) = FakeDriver::new(vec![
            Err(ScrapeError::Launch("no usable chrome".to_string())),
            Ok(FIXTURE.to_string()),
        ]);
        let scraper = Scraper::new(driver, target(2));

        let listings = scraper.scrape_listings().unwrap();
        assert_eq!(listings.len(), 2);

        let log = log.borrow();
        assert_eq!(log.acquired, 2);
        assert_eq!(log.released_ids, vec![1, 2]);
    }

    #[test]
    fn test_navigation_error_is_not_retried() {
        let (driver, log) = FakeDriver::new(vec![Err(ScrapeError::Navigation(
            "dns failure".to_string(),
        ))]);
        let scraper = Scraper::new(driver, target(5));

        let err = scraper.scrape_listings().unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation(_)));

        let log = log.borrow();
        assert_eq!(log.acquired, 1);
        assert_eq!(log.released_ids, vec![1]);
    }

    #[test]
    fn test_extraction_error_releases_and_does_not_retry() {
        let (driver, log) = FakeDriver::new(vec![Ok(FIXTURE.to_string())]);
        let mut bad_target = target(5);
        bad_target.schema.root = ":::".to_string();
        let scraper = Scraper::new(driver, bad_target);

        let err = scraper.scrape_listings().unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction(_)));

        let log = log.borrow();
        assert_eq!(log.acquired, 1);
        assert_eq!(log.released_ids, vec![1]);
    }

    #[test]
    fn test_empty_catalog_is_success() {
        let (driver, _log) = FakeDriver::new(vec![Ok("<html><body></body></html>".to_string())]);
        let scraper = Scraper::new(driver, target(0));

        let listings = scraper.scrape_listings().unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn test_consecutive_scrapes_are_structurally_identical() {
        let (driver, log) =
            FakeDriver::new(vec![Ok(FIXTURE.to_string()), Ok(FIXTURE.to_string())]);
        let scraper = Scraper::new(driver, target(0));

        let first = scraper.scrape_listings().unwrap();
        let second = scraper.scrape_listings().unwrap();
        assert_eq!(first, second);

        // Independent invocations: no session shared between the two.
        let log = log.borrow();
        assert_eq!(log.acquired, 2);
        assert_eq!(log.released_ids, vec![1, 2]);
    }
}
