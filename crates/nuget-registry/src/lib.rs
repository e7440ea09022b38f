//! NuGet V3 registry client
//!
//! This crate provides the registry side of the package client: typed
//! capability traits for the metadata, find-by-id and search resources, a
//! per-call cache context, and an HTTP implementation that resolves those
//! resources from a service index with connection pooling and retry logic.

pub mod api;
pub mod cache;
pub mod client;
pub mod resource;

// Re-export main types
pub use api::{CatalogEntry, RegistrationIndex, RegistrationLeaf, RegistrationPage, SearchResponse, ServiceIndex};
pub use cache::SourceCacheContext;
pub use client::{AuthConfig, ClientOptions, RegistryClient, RetryConfig, NUGET_ORG_V3};
pub use resource::{
    FindPackageByIdResource, PackageMetadataResource, PackageSearchResource, SearchFilter,
    SourceRepository,
};
pub use tokio_util::sync::CancellationToken;

use nuget_core::error::NugetError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, NugetError>;
