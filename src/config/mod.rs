//! Configuration loading and layering.
//!
//! Handles `.ai-reviewer.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod core;
pub mod loader;

pub use core::{
    GatingConfig, LimitsConfig, ModelsConfig, PathFiltersConfig, ReportingConfig, ReportingTarget,
    SCHEMA_VERSION,
};
pub use loader::{Config, PassConfig, ProviderConfig};
