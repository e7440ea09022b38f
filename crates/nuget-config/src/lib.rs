//! Settings for the NuGet package client
//!
//! This crate parses `nuget-client.toml` style settings (source URL, timeouts,
//! retry policy, feed credentials) and turns them into a configured registry
//! client.

pub mod settings;

// Re-export main types
pub use settings::{AuthSettings, ClientSettings, RetrySettings};

use nuget_core::error::NugetError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, NugetError>;
