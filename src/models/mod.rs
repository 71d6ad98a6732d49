pub mod deal;
pub mod zone;

// Re-exports for convenience
pub use deal::Deal;
pub use zone::Zone;
