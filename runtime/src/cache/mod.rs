//! On-disk response cache, namespaced per source.

pub mod store;

pub use store::CacheStore;
