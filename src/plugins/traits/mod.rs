pub mod notifier;
pub mod source;

pub use notifier::{NotificationResult, NotifierPlugin, OutboundMessage, ParseMode};
pub use source::{SourceKind, SourcePlugin};
