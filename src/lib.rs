//! Wagerline — sports-betting backend, bet placement core.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod engine;
pub mod hypermedia;
pub mod registry;
pub mod store;
pub mod types;
