//! Game-scoped view cache.
//!
//! The cache is never the source of truth: it holds what the server last
//! returned for each `(view, game)` pair and only changes after a REST
//! response or an invalidation triggered by a pushed event.

pub mod query_cache;
pub mod query_kind;

pub use query_cache::{CacheEntry, QueryCache};
pub use query_kind::{CacheKey, QueryKind};
