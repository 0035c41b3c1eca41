//! # SubTrack Shared Library
//!
//! This crate contains shared types, utilities, and business logic used by
//! the SubTrack subscription management API.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migration runner
//! - `auth`: JWT and password hashing utilities
//! - `domain`: Pure subscription date logic (active window, remaining days)
//! - `retry`: Bounded exponential-backoff retry executor
//! - `store`: Storage trait and PostgreSQL implementation

pub mod auth;
pub mod db;
pub mod domain;
pub mod models;
pub mod retry;
pub mod store;

/// Current version of the SubTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
