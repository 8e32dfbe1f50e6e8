//! Client-side data layer for the Loreforge publishing CMS.
//!
//! Everything here sits between a UI and the hosted backend service:
//! - Typed row/auth/storage clients over the backend's HTTP APIs
//! - A hierarchical query-key registry for precise cache invalidation
//! - One data-access function per logical backend operation
//! - A stale-while-revalidate query cache with deduplication and retry
//! - A process-wide session store shared by every consumer

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod queries;
pub mod session;
pub mod storage;
pub mod stores;

pub use config::BackendConfig;
pub use error::{DataError, DataResult};
pub use stores::Stores;
