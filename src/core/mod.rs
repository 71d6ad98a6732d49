pub mod composer;
pub mod dedup;
pub mod filter;

pub use composer::NotificationComposer;
pub use dedup::ZoneDedupStore;
pub use filter::DiscountBand;
