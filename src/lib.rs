//! Headless-browser scraper for car-rental listings.
//!
//! The core is one idempotent operation,
//! [`scrape::Scraper::scrape_listings`], which launches an isolated browser
//! session, navigates to the configured catalog page, waits for a readiness
//! condition, extracts [`models::Listing`] records through a data-driven
//! selector schema, and tears the session down on every exit path. The
//! actix-web binary in `main.rs` is a thin collaborator that serves the
//! result as JSON and caches the last successful run in SQLite.

pub mod browser;
pub mod config;
pub mod db;
pub mod extract;
pub mod models;
pub mod scrape;
