//! Registry capabilities consumed by the package client.
//!
//! A [`SourceRepository`] hands out typed resource handles bound to one
//! registry endpoint. Every call accepts a cancellation token; calls that
//! read package data also take a [`SourceCacheContext`].

use std::future::Future;

use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use nuget_core::types::{PackageIdentity, PackageMetadata, Version};

use crate::cache::SourceCacheContext;
use crate::RegistryResult;

pub mod http;

pub use http::{HttpFindPackageByIdResource, HttpMetadataResource, HttpSearchResource};

/// Search options forwarded to the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub include_prerelease: bool,
}

impl SearchFilter {
    pub fn new(include_prerelease: bool) -> Self {
        Self { include_prerelease }
    }
}

/// Package metadata lookups
pub trait PackageMetadataResource: Send + Sync {
    /// Every published version of `id`; empty when the id is unknown
    fn get_metadata(
        &self,
        id: &str,
        include_prerelease: bool,
        include_unlisted: bool,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<Vec<PackageMetadata>>> + Send;

    /// Metadata of one exact version; `None` when id or version is unknown
    fn get_metadata_for(
        &self,
        identity: &PackageIdentity,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<Option<PackageMetadata>>> + Send;
}

/// Per-id archive and version queries
pub trait FindPackageByIdResource: Send + Sync {
    /// Copy the `.nupkg` archive into `destination`.
    ///
    /// Writes nothing when the package or version does not exist.
    fn copy_nupkg_to_writer<W>(
        &self,
        id: &str,
        version: &Version,
        destination: &mut W,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<()>> + Send
    where
        W: AsyncWrite + Unpin + Send;

    /// All versions of `id`; empty when the id is unknown
    fn get_all_versions(
        &self,
        id: &str,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<Vec<Version>>> + Send;

    /// Whether the exact version exists
    fn does_package_exist(
        &self,
        id: &str,
        version: &Version,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<bool>> + Send;
}

/// Free-text package search
pub trait PackageSearchResource: Send + Sync {
    fn search(
        &self,
        term: &str,
        filter: SearchFilter,
        skip: usize,
        take: usize,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<Vec<PackageMetadata>>> + Send;
}

/// Connection to one registry endpoint, resolving typed resources
pub trait SourceRepository: Send + Sync {
    type Metadata: PackageMetadataResource;
    type FindById: FindPackageByIdResource;
    type Search: PackageSearchResource;

    fn metadata_resource(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<Self::Metadata>> + Send;

    fn find_by_id_resource(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<Self::FindById>> + Send;

    fn search_resource(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = RegistryResult<Self::Search>> + Send;
}
