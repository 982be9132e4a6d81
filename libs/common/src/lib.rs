//! Shared foundations for the governance tooling
//!
//! - logging bootstrap (console + optional daily file, reloadable filter)
//! - layered configuration loading (defaults, file, env)
//! - the shared error type

pub mod config;
mod error;
pub mod logging;

pub use error::{Error, Result};
