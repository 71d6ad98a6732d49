use rust_decimal::Decimal;

use crate::models::{Deal, Zone};

pub const DEFAULT_HEADER: &str = "🔥 *JioMart QUICK Deals*";

/// Builds one Telegram (legacy Markdown) message per zone batch.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    header: String,
}

impl NotificationComposer {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    /// Returns `None` when there is nothing to announce.
    pub fn compose(&self, zone: &Zone, deals: &[Deal]) -> Option<String> {
        if deals.is_empty() {
            return None;
        }

        let mut lines = vec![
            self.header.clone(),
            format!("📍 *Pincode:* `{}`", zone),
            String::new(),
        ];

        for deal in deals {
            lines.push(format!(
                "• *{}% OFF* — {}",
                deal.discount().normalize(),
                escape_markdown(deal.name())
            ));
            if let Some(pricing) = format_pricing(deal.price(), deal.mrp()) {
                lines.push(format!("  {}", pricing));
            }
            // Product slugs routinely carry underscores.
            lines.push(format!("  🔗 {}", escape_markdown(deal.url())));
            lines.push(String::new());
        }

        Some(lines.join("\n"))
    }
}

impl Default for NotificationComposer {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER)
    }
}

fn format_pricing(price: Option<Decimal>, mrp: Option<Decimal>) -> Option<String> {
    match (price, mrp) {
        (Some(price), Some(mrp)) => Some(format!("₹{} (MRP ₹{})", price.normalize(), mrp.normalize())),
        (Some(price), None) => Some(format!("₹{}", price.normalize())),
        (None, Some(mrp)) => Some(format!("MRP ₹{}", mrp.normalize())),
        (None, None) => None,
    }
}

/// Escape the characters legacy Markdown treats as entity delimiters.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
