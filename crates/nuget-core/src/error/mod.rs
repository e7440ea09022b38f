//! Error types and result aliases for NuGet operations.
//!
//! Provides a unified error type covering validation, registry, download and
//! filesystem failures with actionable error messages.

use thiserror::Error;

/// Unified error type for all client operations
#[derive(Error, Debug)]
pub enum NugetError {
    // Validation errors
    #[error("Argument '{field}' is invalid: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("Invalid version range: {input}")]
    InvalidVersionRange { input: String },

    #[error("Invalid target framework: {input}")]
    InvalidFramework { input: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    // Registry errors
    #[error("Nuget package {id} {version} does not exist.")]
    PackageNotFound { id: String, version: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Registry protocol error: {message}")]
    Protocol { message: String },

    // Resolution errors
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Operation was cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for NuGet operations
pub type NugetResult<T> = Result<T, NugetError>;

impl NugetError {
    /// Create a validation error for a named argument
    pub fn invalid_argument(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NugetError::Network { .. } | NugetError::Io { .. })
    }

    /// Check if this error is a cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NugetError::Cancelled)
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            NugetError::PackageNotFound { .. } => {
                Some("Check the package id and version, or list versions with get_versions")
            },
            NugetError::Network { .. } => Some("Check your internet connection and try again"),
            NugetError::Protocol { .. } => {
                Some("Check that the source URL points to a NuGet V3 service index")
            },
            NugetError::CircularDependency { .. } => {
                Some("The registry reports a dependency cycle; pin a different root version")
            },
            NugetError::Config { .. } => Some("Fix the settings file and try again"),
            _ => None,
        }
    }
}
