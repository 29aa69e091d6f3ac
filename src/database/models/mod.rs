//! Database Models
//!
//! Record types mapped from the SQLite tables.

mod core;


pub use self::core::*;
