//! # SubTrack API
//!
//! HTTP layer for the SubTrack subscription management service. Built on
//! Axum, it exposes user registration/authentication and JWT-protected
//! subscription CRUD plus the derived reads (active set, remaining days).
//!
//! Layering, outermost first:
//!
//! - `routes` parse requests and shape responses
//! - `service` orchestrates validation, preconditions, and retried store
//!   calls
//! - `subtrack-shared` supplies the domain rules, store, and auth
//!   primitives

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod service;
