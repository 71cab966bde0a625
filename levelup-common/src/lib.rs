//! # Level Up Live Common Library
//!
//! Shared code for the Level Up Live services including:
//! - Domain models (levels, live sessions)
//! - Event types (LiveEvent enum) and the EventBus
//! - Bootstrap configuration loading and root folder resolution
//! - Database initialization
//! - Time utilities

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
