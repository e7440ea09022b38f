//! NuGet package client
//!
//! High-level operations against one NuGet V3 feed:
//! - metadata lookups, latest-version resolution and existence checks
//! - package search
//! - archive download to memory or disk
//! - transitive dependency closure for a target framework
//!
//! ```no_run
//! use nuget_client::{CancellationToken, NugetPackageClient};
//!
//! # async fn run() -> Result<(), nuget_client::NugetError> {
//! let client = NugetPackageClient::new()?;
//! let cancel = CancellationToken::new();
//! if let Some(latest) = client.get_latest("Newtonsoft.Json", &cancel).await? {
//!     println!("{}", latest.identity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod contract;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use client::NugetPackageClient;
pub use contract::{DependenciesRequest, RootPackage, SearchRequest};
pub use resolver::DependencyResolver;

pub use nuget_config::ClientSettings;
pub use nuget_core::{
    nupkg_file_name, nupkg_file_name_for, DependencyGroup, NugetError, PackageDependency,
    PackageIdentity, PackageMetadata, TargetFramework, Version, VersionRange,
};
pub use nuget_registry::{CancellationToken, RegistryClient, SourceRepository};

/// Result type for client operations
pub type ClientResult<T> = Result<T, NugetError>;
