//! Package client facade over one registry connection

use std::path::Path;

use tracing::debug;

use nuget_config::ClientSettings;
use nuget_core::error::NugetError;
use nuget_core::types::{PackageIdentity, PackageMetadata, Version};
use nuget_registry::{
    CancellationToken, FindPackageByIdResource, PackageMetadataResource, PackageSearchResource,
    RegistryClient, SearchFilter, SourceCacheContext, SourceRepository,
};

use crate::contract::{DependenciesRequest, SearchRequest};
use crate::resolver::DependencyResolver;
use crate::ClientResult;

/// Client for package operations against a NuGet feed.
///
/// Every registry call runs with a fresh [`SourceCacheContext`] that disables
/// caching, so results always reflect the feed's current state. Calls are
/// independent: one client can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct NugetPackageClient<R = RegistryClient> {
    repository: R,
}

impl NugetPackageClient<RegistryClient> {
    /// Client for the public nuget.org feed
    pub fn new() -> ClientResult<Self> {
        Ok(Self::with_repository(RegistryClient::new()?))
    }

    /// Client configured from settings
    pub fn from_settings(settings: &ClientSettings) -> ClientResult<Self> {
        Ok(Self::with_repository(settings.registry_client()?))
    }
}

impl<R: SourceRepository> NugetPackageClient<R> {
    /// Client over an existing repository connection
    pub fn with_repository(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Metadata of every version of `id`, prerelease and unlisted included.
    ///
    /// Empty when the id is unknown.
    pub async fn get_all(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<PackageMetadata>> {
        PackageIdentity::validate_id(id)?;
        debug!("Fetching all metadata of {}", id);

        let resource = self.repository.metadata_resource(cancel).await?;
        let cache = SourceCacheContext::for_request();
        resource.get_metadata(id, true, true, &cache, cancel).await
    }

    /// Metadata of `id` at `version`; `None` when either is unknown
    pub async fn get(
        &self,
        id: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<PackageMetadata>> {
        let identity = PackageIdentity::parse(id, version)?;
        self.get_by_identity(&identity, cancel).await
    }

    /// Metadata of one exact package version
    pub async fn get_by_identity(
        &self,
        identity: &PackageIdentity,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<PackageMetadata>> {
        debug!("Fetching metadata of {}", identity);

        let resource = self.repository.metadata_resource(cancel).await?;
        let cache = SourceCacheContext::for_request();
        resource.get_metadata_for(identity, &cache, cancel).await
    }

    /// Every published version of `id`, in registry order
    pub async fn get_versions(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<Version>> {
        PackageIdentity::validate_id(id)?;

        let resource = self.repository.find_by_id_resource(cancel).await?;
        let cache = SourceCacheContext::for_request();
        resource.get_all_versions(id, &cache, cancel).await
    }

    /// Metadata of the highest version of `id`; `None` when it has no versions
    pub async fn get_latest(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<PackageMetadata>> {
        let Some(latest) = self.get_versions(id, cancel).await?.into_iter().max() else {
            debug!("No versions of {}", id);
            return Ok(None);
        };

        self.get_by_identity(&PackageIdentity::new(id, latest), cancel)
            .await
    }

    /// Whether any version of `id` is published
    pub async fn exists(&self, id: &str, cancel: &CancellationToken) -> ClientResult<bool> {
        Ok(!self.get_all(id, cancel).await?.is_empty())
    }

    /// Whether `id` is published at `version`
    pub async fn exists_version(
        &self,
        id: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<bool> {
        let identity = PackageIdentity::parse(id, version)?;

        let resource = self.repository.find_by_id_resource(cancel).await?;
        let cache = SourceCacheContext::for_request();
        resource
            .does_package_exist(&identity.id, &identity.version, &cache, cancel)
            .await
    }

    /// Search the feed; results come back in registry order
    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<PackageMetadata>> {
        debug!(
            skip = request.skip(),
            take = request.take(),
            "Searching for '{}'",
            request.term()
        );

        let resource = self.repository.search_resource(cancel).await?;
        resource
            .search(
                request.term(),
                SearchFilter::new(request.include_prerelease()),
                request.skip(),
                request.take(),
                cancel,
            )
            .await
    }

    /// Download the `.nupkg` archive of `id` at `version` into memory.
    ///
    /// Fails with [`NugetError::PackageNotFound`] when the feed has no such
    /// archive.
    pub async fn download_to_buffer(
        &self,
        id: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<u8>> {
        let identity = PackageIdentity::parse(id, version)?;

        let resource = self.repository.find_by_id_resource(cancel).await?;
        let cache = SourceCacheContext::for_request();

        let mut buffer = Vec::new();
        resource
            .copy_nupkg_to_writer(&identity.id, &identity.version, &mut buffer, &cache, cancel)
            .await?;

        // The registry writes nothing for a missing archive
        if buffer.is_empty() {
            return Err(NugetError::PackageNotFound {
                id: id.to_string(),
                version: version.to_string(),
            });
        }

        debug!(bytes = buffer.len(), "Downloaded {}", identity);
        Ok(buffer)
    }

    /// Download the archive and write it to `path`, replacing any existing file
    pub async fn download_to_file(
        &self,
        id: &str,
        version: &str,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        let path = path.as_ref();
        let buffer = self.download_to_buffer(id, version, cancel).await?;

        tokio::fs::write(path, &buffer)
            .await
            .map_err(|e| NugetError::io(format!("Failed to write {}", path.display()), e))?;

        debug!("Saved {} {} to {}", id, version, path.display());
        Ok(())
    }

    /// Transitive dependencies of the request's root package.
    ///
    /// Packages come back in depth-first pre-order, siblings sorted by id.
    /// Returns an empty list when the root package does not exist. Large
    /// dependency trees issue one registry call per dependency; use
    /// [`DependenciesRequest::ignore_author`] to prune unwanted subtrees.
    pub async fn get_dependencies(
        &self,
        request: &DependenciesRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<PackageMetadata>> {
        DependencyResolver::new(self, request).resolve(cancel).await
    }
}
