use rust_decimal::Decimal;
use serde::Serialize;
use url::Url;

/// A single product offer produced by a source.
///
/// Every instance has passed [`Deal::new`]: non-empty id and name, a
/// discount in `0..=100` and an absolute http(s) product URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deal {
    id: String,
    name: String,
    discount: Decimal,
    mrp: Option<Decimal>,
    price: Option<Decimal>,
    url: String,
}

impl Deal {
    /// Validate raw fields into a deal. Returns `None` for anything that
    /// would make a partial or nonsensical record.
    pub fn new(id: &str, name: &str, discount: impl Into<Decimal>, url: &str) -> Option<Self> {
        let id = id.trim();
        let name = name.trim();
        if id.is_empty() || name.is_empty() {
            return None;
        }

        let discount = discount.into();
        if discount.is_sign_negative() || discount > Decimal::ONE_HUNDRED {
            return None;
        }
        let url = Url::parse(url.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            discount,
            mrp: None,
            price: None,
            url: url.to_string(),
        })
    }

    /// Attach MRP and selling price. Negative amounts are treated as unknown.
    pub fn with_pricing(mut self, mrp: Option<Decimal>, price: Option<Decimal>) -> Self {
        self.mrp = mrp.filter(|v| !v.is_sign_negative());
        self.price = price.filter(|v| !v.is_sign_negative());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact percentage as listed; fractional values are kept.
    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn mrp(&self) -> Option<Decimal> {
        self.mrp
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
