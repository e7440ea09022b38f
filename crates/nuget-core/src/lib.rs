//! # nuget-core
//!
//! Core types and utilities shared across all nuget-client crates.
//!
//! This crate provides:
//! - NuGet `Version` and `VersionRange` types
//! - `TargetFramework` monikers compared by exact value
//! - `PackageIdentity`, `PackageMetadata` and dependency groups
//! - `NugetError` enum for unified error handling
//! - Helpers for package file names and author matching
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, PackageMetadata, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{NugetError, NugetResult};
pub use types::{
    DependencyGroup, PackageDependency, PackageIdentity, PackageMetadata, TargetFramework,
    Version, VersionRange,
};
pub use utils::filename::{nupkg_file_name, nupkg_file_name_for};
