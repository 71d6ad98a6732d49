use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::StorefrontConfig;
use crate::models::Deal;
use crate::utils::error::AppError;

/// Pulls deals out of rendered catalog HTML.
///
/// Every field lookup is extract-or-skip: a card missing its discount, name
/// or link is left out and the rest of the page is still used. Cards carry no
/// catalog id, so the resolved product URL doubles as the deal id.
pub struct CardExtractor {
    card: Selector,
    name: Selector,
    link: Selector,
    trailing_number: Regex,
    base: Url,
}

fn parse_selector(field: &str, selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector).map_err(|e| AppError::Plugin {
        plugin_type: "browser".to_string(),
        message: format!("Invalid CSS selector for {} '{}': {:?}", field, selector, e),
    })
}

impl CardExtractor {
    pub fn new(config: &StorefrontConfig) -> Result<Self, AppError> {
        let base = Url::parse(&config.catalog_url).map_err(|e| AppError::Plugin {
            plugin_type: "browser".to_string(),
            message: format!("Invalid catalog URL '{}': {}", config.catalog_url, e),
        })?;

        Ok(Self {
            card: parse_selector("card", &config.card_selector)?,
            name: parse_selector("name", &config.name_selector)?,
            link: parse_selector("link", &config.link_selector)?,
            trailing_number: Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*$").map_err(|e| AppError::Plugin {
                plugin_type: "browser".to_string(),
                message: e.to_string(),
            })?,
            base,
        })
    }

    pub fn extract(&self, html: &str) -> Vec<Deal> {
        let document = Html::parse_document(html);
        let mut total = 0usize;

        let deals: Vec<Deal> = document
            .select(&self.card)
            .inspect(|_| total += 1)
            .filter_map(|card| self.extract_card(card))
            .collect();

        if total > deals.len() {
            tracing::debug!(cards = total, usable = deals.len(), "Skipped incomplete product cards");
        }
        deals
    }

    fn extract_card(&self, card: ElementRef<'_>) -> Option<Deal> {
        let discount = self.discount(&element_text(card))?;
        let name = self.name(card)?;
        let url = self.link(card)?;
        Deal::new(&url, &name, discount, &url)
    }

    /// The number written immediately before the first `%` in `text`,
    /// fractional part included.
    pub fn discount(&self, text: &str) -> Option<Decimal> {
        let (before, _) = text.split_once('%')?;
        let captures = self.trailing_number.captures(before)?;
        captures.get(1)?.as_str().parse().ok()
    }

    fn name(&self, card: ElementRef<'_>) -> Option<String> {
        let name = element_text(card.select(&self.name).next()?);
        (!name.is_empty()).then_some(name)
    }

    fn link(&self, card: ElementRef<'_>) -> Option<String> {
        let href = card
            .select(&self.link)
            .find_map(|a| a.value().attr("href"))
            .or_else(|| card.value().attr("href"))?;
        self.base.join(href.trim()).ok().map(String::from)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
