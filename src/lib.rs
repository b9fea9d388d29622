//! A small online bookstore split into three replicated services: a frontend
//! that caches catalog reads and fans purchases out across order replicas, a
//! primary/secondary catalog pair and a primary/secondary order pair.
//!
//! Replication is best effort. A write applies locally and is then propagated
//! to the peer with a sync call whose outcome the writer never observes, so
//! the pairs converge only when every propagation call lands. The known gaps
//! of that model (replayed syncs double-apply, orders without a matching
//! stock decrement) are kept and pinned by tests rather than papered over.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod frontend;
pub mod order;
pub mod replica;
pub mod store;

pub use error::BazarError;
pub use store::{Book, BookStore, Order, OrderStore};

pub type Result<T> = std::result::Result<T, BazarError>;

/// Maximum number of book records held by the frontend cache.
pub const CACHE_SIZE: usize = 5;

pub const CATALOG_LOG_NAME: &str = "catalog.log";
pub const ORDERS_LOG_NAME: &str = "orders.log";
