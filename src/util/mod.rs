//! Utility modules: cache, timeout.

pub mod cache;
pub mod timeout;
