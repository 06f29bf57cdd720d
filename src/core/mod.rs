//! Core module - shared infrastructure for Tandem
//!
//! This module contains the unified content model, configuration, logging
//! and error handling used throughout the application.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{Config, ProviderKind};
pub use error::{Result, TandemError};
pub use types::*;
