//! Shared utilities for insight-rs
//!
//! This crate provides common functionality used across the insight-rs workspace,
//! including logging setup, `.env` loading, and typed environment lookups.

pub mod config;
pub mod logging;

pub use config::{Config, EnvLookup, LogFormat, load_env_file};
pub use logging::init_tracing_with;
