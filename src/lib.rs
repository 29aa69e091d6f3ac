/// Raveling - MUD content designer and approval backend
///
/// Design configs are authored as YAML in a GitHub-backed design store,
/// promoted into a production table on approval, and analyzed with a
/// Monte Carlo damage simulator.

pub mod api;
pub mod config;
pub mod core;
pub mod database;


pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
