//! HTML extraction for wiki pages
//!
//! This module handles parsing page bodies to extract:
//! - The article title, trying the configured title selectors in order
//! - Raw link hrefs inside a CSS scope, in document order
//!
//! Anchors carrying an excluded class (images, citations, external and red
//! links) are dropped here, before classification.

use crate::config::WikiConfig;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors raised while extracting from a document
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Pulls the title and link hrefs out of a raw document body
pub trait PageExtractor: Send + Sync {
    /// Returns the page title, `None` if no title selector matches text
    fn extract_title(&self, body: &str) -> Option<String>;

    /// Returns every href under `scope_selector`, in document order
    fn extract_links(&self, body: &str, scope_selector: &str) -> Result<Vec<String>, ExtractError>;
}

/// Extractor backed by `scraper`
#[derive(Debug, Clone)]
pub struct ScraperExtractor {
    title_selectors: Vec<Selector>,
    excluded_classes: Vec<String>,
}

impl ScraperExtractor {
    /// Builds an extractor from the wiki configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Wiki section providing title selectors and excluded classes
    ///
    /// # Returns
    ///
    /// * `Ok(ScraperExtractor)` - All title selectors parsed
    /// * `Err(ExtractError)` - A title selector is not valid CSS
    pub fn new(config: &WikiConfig) -> Result<Self, ExtractError> {
        let title_selectors = config
            .title_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            title_selectors,
            excluded_classes: config.excluded_link_classes.clone(),
        })
    }

    fn is_excluded(&self, element: &ElementRef) -> bool {
        element
            .value()
            .classes()
            .any(|class| self.excluded_classes.iter().any(|e| e == class))
    }
}

impl PageExtractor for ScraperExtractor {
    fn extract_title(&self, body: &str) -> Option<String> {
        let document = Html::parse_document(body);

        self.title_selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })
    }

    fn extract_links(&self, body: &str, scope_selector: &str) -> Result<Vec<String>, ExtractError> {
        let selector = parse_selector(scope_selector)?;
        let document = Html::parse_document(body);

        let links = document
            .select(&selector)
            .filter(|element| !self.is_excluded(element))
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim().to_string())
            .collect();

        Ok(links)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
