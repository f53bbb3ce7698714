//! Core shared library for the autotag services.
//!
//! This crate exposes reusable primitives that the other crates depend
//! on: the canonical error type, configuration loading, database pool
//! abstraction and logging setup.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;

pub use config::{CoreConfig, Environment};
pub use db::DatabasePool;
pub use errors::{AutotagError, Result as CoreResult};
