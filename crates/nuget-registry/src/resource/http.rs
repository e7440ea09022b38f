//! Resource implementations over the NuGet V3 HTTP protocol

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use nuget_core::error::NugetError;
use nuget_core::types::{PackageIdentity, PackageMetadata, Version};

use super::{FindPackageByIdResource, PackageMetadataResource, PackageSearchResource, SearchFilter};
use crate::api::{
    FlatContainerVersions, RegistrationIndex, RegistrationLeaf, RegistrationPage, SearchResponse,
    SearchResult,
};
use crate::cache::SourceCacheContext;
use crate::client::{cancellable, parse_url, RegistryClient};
use crate::RegistryResult;

/// SemVer level requested from search so SemVer 2.0 packages are included
const SEMVER_LEVEL: &str = "2.0.0";

/// Registration (`RegistrationsBaseUrl`) resource
#[derive(Debug, Clone)]
pub struct HttpMetadataResource {
    client: RegistryClient,
    base_url: String,
}

impl HttpMetadataResource {
    pub(crate) fn new(client: RegistryClient, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn index_url(&self, id: &str) -> RegistryResult<Url> {
        parse_url(&format!("{}/{}/index.json", self.base_url, id.to_ascii_lowercase()))
    }

    /// Registration leaves of `id`, restricted to pages that may hold `version`
    async fn leaves(
        &self,
        id: &str,
        version: Option<&Version>,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> RegistryResult<Vec<RegistrationLeaf>> {
        let url = self.index_url(id)?;
        let Some(index) = self
            .client
            .get_json::<RegistrationIndex>(&url, Some(cache), cancel)
            .await?
        else {
            debug!("No registration for {}", id);
            return Ok(Vec::new());
        };

        let mut leaves = Vec::new();
        for page in index.items {
            if version.is_some_and(|v| !page.may_contain(v)) {
                continue;
            }
            match page.items {
                Some(items) => leaves.extend(items),
                None => {
                    let page_url = parse_url(&page.id)?;
                    if let Some(fetched) = self
                        .client
                        .get_json::<RegistrationPage>(&page_url, Some(cache), cancel)
                        .await?
                    {
                        leaves.extend(fetched.items.unwrap_or_default());
                    }
                },
            }
        }
        Ok(leaves)
    }
}

impl PackageMetadataResource for HttpMetadataResource {
    async fn get_metadata(
        &self,
        id: &str,
        include_prerelease: bool,
        include_unlisted: bool,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> RegistryResult<Vec<PackageMetadata>> {
        let leaves = self.leaves(id, None, cache, cancel).await?;

        let mut packages = Vec::with_capacity(leaves.len());
        for leaf in leaves {
            let metadata = leaf.catalog_entry.into_metadata()?;
            let wanted = (include_prerelease || !metadata.version().is_prerelease())
                && (include_unlisted || metadata.listed);
            if wanted {
                packages.push(metadata);
            }
        }
        Ok(packages)
    }

    async fn get_metadata_for(
        &self,
        identity: &PackageIdentity,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> RegistryResult<Option<PackageMetadata>> {
        let leaves = self
            .leaves(&identity.id, Some(&identity.version), cache, cancel)
            .await?;

        for leaf in leaves {
            let metadata = leaf.catalog_entry.into_metadata()?;
            if metadata.version() == &identity.version {
                return Ok(Some(metadata));
            }
        }
        Ok(None)
    }
}

/// Flat container (`PackageBaseAddress`) resource
#[derive(Debug, Clone)]
pub struct HttpFindPackageByIdResource {
    client: RegistryClient,
    base_url: String,
}

impl HttpFindPackageByIdResource {
    pub(crate) fn new(client: RegistryClient, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn versions_url(&self, id: &str) -> RegistryResult<Url> {
        parse_url(&format!("{}/{}/index.json", self.base_url, id.to_ascii_lowercase()))
    }

    fn nupkg_url(&self, id: &str, version: &Version) -> RegistryResult<Url> {
        let id = id.to_ascii_lowercase();
        let version = version.to_normalized_lowercase();
        parse_url(&format!(
            "{}/{}/{}/{}.{}.nupkg",
            self.base_url, id, version, id, version
        ))
    }
}

impl FindPackageByIdResource for HttpFindPackageByIdResource {
    async fn copy_nupkg_to_writer<W>(
        &self,
        id: &str,
        version: &Version,
        destination: &mut W,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> RegistryResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let url = self.nupkg_url(id, version)?;
        let Some(mut response) = self.client.get(&url, Some(cache), cancel).await? else {
            debug!("No archive for {} {}", id, version);
            return Ok(());
        };

        let write_error =
            |e: std::io::Error| NugetError::io(format!("Failed to write archive of {} {}", id, version), e);

        let mut copied = 0usize;
        loop {
            let chunk = cancellable(cancel, async {
                response.chunk().await.map_err(|e| {
                    NugetError::network(format!("Failed to read archive {}: {}", url, e), e)
                })
            })
            .await?;

            let Some(chunk) = chunk else { break };
            destination.write_all(&chunk).await.map_err(write_error)?;
            copied += chunk.len();
        }
        destination.flush().await.map_err(write_error)?;

        debug!(bytes = copied, "Copied archive of {} {}", id, version);
        Ok(())
    }

    async fn get_all_versions(
        &self,
        id: &str,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> RegistryResult<Vec<Version>> {
        let url = self.versions_url(id)?;
        let Some(document) = self
            .client
            .get_json::<FlatContainerVersions>(&url, Some(cache), cancel)
            .await?
        else {
            return Ok(Vec::new());
        };

        Ok(document
            .versions
            .iter()
            .filter_map(|v| match Version::parse(v) {
                Ok(version) => Some(version),
                Err(e) => {
                    warn!("Ignoring version of {}: {}", id, e);
                    None
                },
            })
            .collect())
    }

    async fn does_package_exist(
        &self,
        id: &str,
        version: &Version,
        cache: &SourceCacheContext,
        cancel: &CancellationToken,
    ) -> RegistryResult<bool> {
        let versions = self.get_all_versions(id, cache, cancel).await?;
        Ok(versions.contains(version))
    }
}

/// Search query service resource
#[derive(Debug, Clone)]
pub struct HttpSearchResource {
    client: RegistryClient,
    base_url: String,
}

impl HttpSearchResource {
    pub(crate) fn new(client: RegistryClient, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl PackageSearchResource for HttpSearchResource {
    async fn search(
        &self,
        term: &str,
        filter: SearchFilter,
        skip: usize,
        take: usize,
        cancel: &CancellationToken,
    ) -> RegistryResult<Vec<PackageMetadata>> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("q", term.to_string()),
                ("skip", skip.to_string()),
                ("take", take.to_string()),
                ("prerelease", filter.include_prerelease.to_string()),
                ("semVerLevel", SEMVER_LEVEL.to_string()),
            ],
        )
        .map_err(|e| NugetError::protocol(format!("Invalid search URL {}: {}", self.base_url, e)))?;

        let Some(response) = self.client.get_json::<SearchResponse>(&url, None, cancel).await? else {
            return Ok(Vec::new());
        };

        debug!(total_hits = response.total_hits, "Search for '{}'", term);
        response
            .data
            .into_iter()
            .map(SearchResult::into_metadata)
            .collect()
    }
}
