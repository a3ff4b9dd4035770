//! Data models
//!
//! Shared between stall-server and its HTTP clients.
//! Timestamps are Unix millis (UTC), menu item IDs are `i64`.

pub mod menu;
pub mod order;

// Re-exports
pub use menu::*;
pub use order::*;
