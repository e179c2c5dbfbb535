//! Schema-driven listing extraction
//!
//! Extraction runs against a single HTML snapshot of the rendered page, so
//! markup drift on the target site is a configuration change: every field is
//! a CSS selector plus an extraction rule supplied as data, never a
//! hard-coded identifier in logic.

use crate::models::Listing;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to pull a value out of a matched element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExtractRule {
    /// The element's text content, trimmed
    Text,
    /// A named attribute, e.g. `src` or `href`
    Attr(String),
}

impl FromStr for ExtractRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "text" {
            return Ok(ExtractRule::Text);
        }
        let attr = s
            .strip_prefix("attr:")
            .or_else(|| s.strip_prefix("attribute:"));
        match attr {
            Some(name) if !name.is_empty() => Ok(ExtractRule::Attr(name.to_string())),
            _ => Err(format!(
                "unknown extraction rule '{}' (expected \"text\" or \"attr:<name>\")",
                s
            )),
        }
    }
}

impl fmt::Display for ExtractRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractRule::Text => write!(f, "text"),
            ExtractRule::Attr(name) => write!(f, "attr:{}", name),
        }
    }
}

impl TryFrom<String> for ExtractRule {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ExtractRule> for String {
    fn from(rule: ExtractRule) -> Self {
        rule.to_string()
    }
}

/// One output field: where to look inside a container and what to take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub selector: String,
    pub rule: ExtractRule,
}

impl FieldRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            rule: ExtractRule::Text,
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self {
            selector: selector.to_string(),
            rule: ExtractRule::Attr(attr.to_string()),
        }
    }
}

/// Maps listing fields to selectors within a root container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// Selector matching one container per listing
    pub root: String,
    /// The only mandatory field; containers without it are dropped
    pub name: FieldRule,
    #[serde(default)]
    pub price: Option<FieldRule>,
    #[serde(default)]
    pub image: Option<FieldRule>,
    #[serde(default)]
    pub link: Option<FieldRule>,
}

/// Extraction failures. A selector matching nothing is not an error (the
/// field is simply absent); only a malformed schema fails.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Extract listings from an HTML snapshot, in document order.
///
/// Zero root matches is a valid, empty catalog. A container whose name
/// selector yields nothing (or only whitespace) is excluded; any other
/// missing field leaves that field absent without affecting the rest.
pub fn extract_listings(html: &str, schema: &ExtractionSchema) -> Result<Vec<Listing>, ExtractError> {
    // All selectors are validated up front so a malformed schema fails
    // before producing a partial result.
    let root = parse_selector(&schema.root)?;
    let name = parse_selector(&schema.name.selector)?;
    let price = schema.price.as_ref().map(|f| parse_selector(&f.selector)).transpose()?;
    let image = schema.image.as_ref().map(|f| parse_selector(&f.selector)).transpose()?;
    let link = schema.link.as_ref().map(|f| parse_selector(&f.selector)).transpose()?;

    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for container in document.select(&root) {
        let name_value = match resolve_field(&container, &name, &schema.name.rule) {
            Some(value) => value,
            None => {
                log::debug!("Dropping container without a usable name");
                continue;
            }
        };

        let resolve_opt = |sel: &Option<Selector>, field: &Option<FieldRule>| {
            match (sel, field) {
                (Some(sel), Some(field)) => resolve_field(&container, sel, &field.rule),
                _ => None,
            }
        };

        listings.push(Listing {
            name: name_value,
            price: resolve_opt(&price, &schema.price),
            image_url: resolve_opt(&image, &schema.image),
            detail_url: resolve_opt(&link, &schema.link),
        });
    }

    Ok(listings)
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Resolve one field within a container. The first matching descendant
/// wins; no match, an absent attribute, or a blank value all yield `None`.
fn resolve_field(container: &ElementRef, selector: &Selector, rule: &ExtractRule) -> Option<String> {
    let element = container.select(selector).next()?;

    let raw = match rule {
        ExtractRule::Text => element.text().collect::<String>(),
        ExtractRule::Attr(name) => element.value().attr(name)?.to_string(),
    };

    let value = raw.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
