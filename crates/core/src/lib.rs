//! Parley Core Library
//!
//! This crate provides the foundational utilities for the Parley assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - The role/department access vocabulary (`Role`, `Department`, `AccessPolicy`)

pub mod access;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use access::{AccessPolicy, Department, Role};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
