//! Response cache for gatehouse read routes
//!
//! Read responses are stored under a key derived from the request path and
//! its sorted query parameters, tagged with the collection they were read
//! from. A successful write to a collection invalidates every entry tagged
//! with it.

pub mod entry;
pub mod keys;
pub mod store;

pub use entry::{CacheEntry, CacheStats, CachedResponse};
pub use keys::CacheKey;
pub use store::ResponseCache;
