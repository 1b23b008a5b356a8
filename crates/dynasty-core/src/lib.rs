// Library root: re-exports all modules so integration tests and the CLI can
// access the crate's public API.

pub mod codec;
pub mod config;
pub mod context;
pub mod db;
pub mod keys;
pub mod kv;
pub mod model;
pub mod opponents;
pub mod schedule_editor;
pub mod season;
pub mod snapshot;
pub mod stats;
pub mod teams;
pub mod users;
