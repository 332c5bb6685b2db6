//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the sync daemon:
//! - Configuration document and validation
//! - Event bus system
//! - Logging and tracing infrastructure

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
