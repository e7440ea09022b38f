//! Core data types for NuGet package management.
//!
//! This module provides the fundamental types used throughout the client:
//! - Version and version range types
//! - Target framework monikers
//! - Package identity and metadata structures

pub mod framework;
pub mod identity;
pub mod package;
pub mod range;
pub mod version;

// Re-export all public types
pub use framework::TargetFramework;
pub use identity::PackageIdentity;
pub use package::{DependencyGroup, PackageDependency, PackageMetadata};
pub use range::VersionRange;
pub use version::Version;
