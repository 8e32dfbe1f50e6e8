//! Data-access functions: one per logical backend operation.
//!
//! Each function issues exactly one request (or, for "with relations" /
//! "with chapters" reads, one primary fetch followed by independent
//! fan-out reads run concurrently) and returns a normalized result or a
//! typed failure.

pub mod map;
pub mod media;
pub mod profiles;
pub mod stories;
pub mod wiki;
