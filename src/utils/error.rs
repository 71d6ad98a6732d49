use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Plugin error: {plugin_type}: {message}")]
    Plugin { plugin_type: String, message: String },
}

/// Failure to obtain deals for one zone. Never fatal to the monitor loop.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("Malformed response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Rendering session error: {0}")]
    Session(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },
}

/// Failure to hand a composed message to the chat channel.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Message rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
