//! Order lifecycle
//!
//! - **manager**: OrdersManager, the lifecycle engine (create / verify / complete / cancel)
//! - **validator**: request validation against the menu catalog
//! - **sequence**: per-date order sequence and queue number counters, evaluated inside store writes
//! - **storage**: redb-backed [`OrderStore`] with uniqueness indexes
//! - **cache**: optional best-effort cache hint
//! - **expiry_scheduler**: periodic cancellation of unpaid orders
//! - **money**: decimal totals
//!
//! # Architecture
//!
//! ```text
//! HTTP handler → OrdersManager → OrderValidator → MenuCatalog
//!                     │
//!                     ├─ OrderStore (redb)   conditional writes
//!                     │     └─ sequence       max + 1，同一写事务内
//!                     └─ OrderCache (hint)
//!
//! ExpiryScheduler ──bulk_expire──▶ OrderStore
//!        └──────evict_expired────▶ OrderCache
//! ```

pub mod cache;
pub mod expiry_scheduler;
pub mod manager;
pub mod money;
pub mod sequence;
pub mod storage;
pub mod validator;

// Re-exports
pub use cache::{CacheError, MemoryOrderCache, NoopOrderCache, OrderCache};
pub use expiry_scheduler::ExpiryScheduler;
pub use manager::{OrderError, OrderResult, OrdersManager};
pub use storage::{OrderStorage, OrderStore, StatusPatch};
pub use validator::OrderValidator;
