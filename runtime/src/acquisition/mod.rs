//! Fetch engine: per-source HTTP sessions, retry policies and picture
//! discovery with the renderer fallback.

pub mod discovery;
pub mod http_client;
pub mod retry;
pub mod session;
