//! Common Test Utilities
//!
//! Database and application fixtures plus request helpers for the router.

pub mod fixtures;

pub use fixtures::*;
