//! # spoofscan Common Library
//!
//! Shared code for the spoofscan services:
//! - Error type shared by configuration and bootstrap code
//! - TOML configuration file resolution and loading
//! - Logging configuration and subscriber setup
//! - UUID helpers

pub mod config;
pub mod error;
pub mod uuid_utils;

pub use error::{Error, Result};
