// Source plugin implementations
pub mod rendered_page;
pub mod structured_query;

pub use rendered_page::RenderedPageSource;
pub use structured_query::StructuredQuerySource;
