use crate::browser::{BrowserConfig, Readiness};
use crate::extract::{ExtractionSchema, FieldRule};
use crate::scrape::ScrapeTarget;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub scraper: ScraperSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    /// Browser headless mode
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Pass --no-sandbox; Chrome refuses to start sandboxed in most containers
    #[serde(default = "default_true")]
    pub disable_sandbox: bool,

    /// Upper bound on browser process start, in seconds
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout_secs: u64,

    /// Disable images in browser (faster loading)
    #[serde(default = "default_true")]
    pub disable_images: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScraperSettings {
    /// Page carrying the listing catalog
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Readiness mode: "selector" (wait for `wait_selector`) or
    /// "network-idle"
    #[serde(default = "default_readiness")]
    pub readiness: String,

    /// Selector that marks the data-bearing region as loaded
    #[serde(default = "default_wait_selector")]
    pub wait_selector: String,

    /// Readiness deadline per navigation attempt, in seconds
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Extra attempts after the first, for launch failures and timeouts only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// SQLite file caching the last successful scrape
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Field-to-selector mapping evaluated against the loaded page
    #[serde(default = "default_schema")]
    pub schema: ExtractionSchema,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 3000 }
fn default_true() -> bool { true }
fn default_launch_timeout() -> u64 { 30 }
fn default_target_url() -> String { "https://www.hertz.gr/en/car-rental/".to_string() }
fn default_readiness() -> String { "selector".to_string() }
fn default_wait_selector() -> String { ".car-info-wrapper".to_string() }
fn default_navigation_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 2 }
fn default_cache_path() -> String { "cars.db".to_string() }

fn default_schema() -> ExtractionSchema {
    ExtractionSchema {
        root: ".b-vehicle__header".to_string(),
        name: FieldRule::text(".b-vehicle__title"),
        price: Some(FieldRule::text(".car-price")),
        image: Some(FieldRule::attr("img", "src")),
        link: Some(FieldRule::attr("a", "href")),
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            disable_sandbox: true,
            launch_timeout_secs: default_launch_timeout(),
            disable_images: true,
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            readiness: default_readiness(),
            wait_selector: default_wait_selector(),
            navigation_timeout_secs: default_navigation_timeout(),
            max_retries: default_max_retries(),
            cache_path: default_cache_path(),
            schema: default_schema(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when it is missing or unreadable.
    pub fn load() -> Self {
        Self::load_from(Path::new("config.toml"))
    }

    fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match toml::from_str::<Config>(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring malformed {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Browser session options for this configuration
    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            headless: self.browser.headless,
            disable_sandbox: self.browser.disable_sandbox,
            launch_timeout_secs: self.browser.launch_timeout_secs,
            disable_images: self.browser.disable_images,
            ..BrowserConfig::default()
        }
    }

    /// Scrape target (URL, readiness, schema, retry policy) for this
    /// configuration
    pub fn scrape_target(&self) -> ScrapeTarget {
        let readiness = match self.scraper.readiness.as_str() {
            "network-idle" => Readiness::NetworkIdle,
            "selector" => Readiness::SelectorPresent(self.scraper.wait_selector.clone()),
            other => {
                log::warn!("Unknown readiness mode '{}', using selector wait", other);
                Readiness::SelectorPresent(self.scraper.wait_selector.clone())
            }
        };

        ScrapeTarget {
            url: self.scraper.target_url.clone(),
            readiness,
            schema: self.scraper.schema.clone(),
            navigation_timeout: Duration::from_secs(self.scraper.navigation_timeout_secs),
            max_retries: self.scraper.max_retries,
        }
    }
}
