//! Browser automation for scraping JavaScript-rendered listing pages
//!
//! The target catalog only materializes its listings after client-side
//! scripts run, so plain HTTP fetching sees an empty shell. This module
//! drives a headless Chrome process instead: [`BrowserSession`] owns the
//! process lifecycle (released exactly once, on every exit path) and
//! [`PageNavigator`] loads a URL, blocks until a readiness condition holds,
//! and snapshots the rendered DOM for offline extraction.

pub mod config;
pub mod navigator;
pub mod session;

pub use config::BrowserConfig;
pub use navigator::{PageNavigator, Readiness};
pub use session::{BrowserError, BrowserSession};
