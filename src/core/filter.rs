use rust_decimal::Decimal;

use crate::models::Deal;

pub const DEFAULT_MIN_DISCOUNT: u8 = 70;
pub const DEFAULT_MAX_DISCOUNT: u8 = 99;

/// Inclusive discount range a deal must fall in to be announced.
///
/// Bounds are compared against the exact listed discount, so 99.5 is outside
/// a band that ends at 99.
///
/// The default upper bound stops at 99: a "100% off" listing is almost
/// always a free sample or bad data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountBand {
    min: u8,
    max: u8,
}

impl DiscountBand {
    pub fn new(min: u8, max: u8) -> Option<Self> {
        (min <= max && max <= 100).then_some(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn qualifies(&self, deal: &Deal) -> bool {
        (Decimal::from(self.min)..=Decimal::from(self.max)).contains(&deal.discount())
    }

    /// Keep qualifying deals, preserving source order.
    pub fn apply(&self, deals: Vec<Deal>) -> Vec<Deal> {
        deals.into_iter().filter(|d| self.qualifies(d)).collect()
    }
}

impl Default for DiscountBand {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DISCOUNT,
            max: DEFAULT_MAX_DISCOUNT,
        }
    }
}
