//! # HMDB Common Library
//!
//! Shared code for the HMDB batch tools including:
//! - Common error type
//! - Configuration and credential resolution
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
