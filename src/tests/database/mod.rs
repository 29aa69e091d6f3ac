//! Database operation tests against a temporary SQLite file.

mod configs;
