use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::config::SearchApiConfig;
use crate::models::{Deal, Zone};
use crate::plugins::traits::{SourceKind, SourcePlugin};
use crate::utils::error::SourceError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub page: u32,
    pub rows: u32,
    pub pincode: &'a str,
    pub serviceability_tags: [&'a str; 1],
    pub sort: &'a str,
}

/// One product as the search endpoint returns it. Everything is optional
/// here; [`ProductRecord::into_deal`] decides what is usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: Option<serde_json::Value>,
    pub display_name: Option<String>,
    pub discount: Option<serde_json::Value>,
    pub mrp: Option<serde_json::Value>,
    pub selling_price: Option<serde_json::Value>,
    pub seo_url: Option<String>,
}

impl ProductRecord {
    pub fn into_deal(self, url_prefix: &str) -> Option<Deal> {
        let id = match self.id? {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let name = self.display_name?;
        let discount = json_decimal(&self.discount?)?;
        let seo_url = self.seo_url?;
        let url = format!("{}{}", url_prefix, seo_url.trim_start_matches('/'));

        let mrp = self.mrp.as_ref().and_then(json_decimal);
        let price = self.selling_price.as_ref().and_then(json_decimal);

        Deal::new(&id, &name, discount, &url).map(|deal| deal.with_pricing(mrp, price))
    }
}

/// Accept numbers and numeric strings; the endpoint is not consistent.
fn json_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                // Shortest decimal form first so 72.6 stays 72.6.
                Decimal::from_str(&n.to_string())
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            }
        }
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Parse a search response body. Individual malformed products are
/// skipped; a body that is not JSON or has no `products` array is an error.
pub fn parse_search_response(body: &str, url_prefix: &str) -> Result<Vec<Deal>, SourceError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let products = value
        .get("products")
        .and_then(|p| p.as_array())
        .ok_or_else(|| SourceError::Shape("response has no products array".to_string()))?;

    let deals = products
        .iter()
        .filter_map(|p| serde_json::from_value::<ProductRecord>(p.clone()).ok())
        .filter_map(|record| record.into_deal(url_prefix))
        .collect();

    Ok(deals)
}

/// Queries the storefront's JSON search endpoint directly, one POST per zone.
pub struct StructuredQuerySource {
    client: Client,
    config: SearchApiConfig,
}

impl StructuredQuerySource {
    pub fn new(config: SearchApiConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn request_body<'a>(&'a self, zone: &'a Zone) -> SearchRequest<'a> {
        SearchRequest {
            query: "",
            page: 1,
            rows: self.config.rows,
            pincode: zone.as_str(),
            serviceability_tags: [self.config.serviceability_tag.as_str()],
            sort: &self.config.sort,
        }
    }

    fn map_transport(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                seconds: self.config.request_timeout_secs,
            }
        } else {
            SourceError::Transport(err)
        }
    }
}

#[async_trait]
impl SourcePlugin for StructuredQuerySource {
    fn name(&self) -> &str {
        "JioMart search API"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::StructuredQuery
    }

    async fn fetch(&self, zone: &Zone) -> Result<Vec<Deal>, SourceError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&self.request_body(zone))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        let deals = parse_search_response(&body, &self.config.product_url_prefix)?;

        tracing::debug!(zone = %zone, count = deals.len(), "Search API returned deals");
        Ok(deals)
    }
}
