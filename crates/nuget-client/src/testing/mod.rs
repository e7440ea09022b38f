//! In-memory registry for client tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use nuget_core::error::NugetError;
use nuget_core::types::{
    DependencyGroup, PackageIdentity, PackageMetadata, TargetFramework, Version, VersionRange,
};
use nuget_registry::{
    CancellationToken, FindPackageByIdResource, PackageMetadataResource, PackageSearchResource,
    RegistryResult, SearchFilter, SourceCacheContext, SourceRepository,
};

/// Registry backed by a fixed package list that records every call
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRepository {
    packages: Vec<PackageMetadata>,
    archives: HashMap<PackageIdentity, Vec<u8>>,
    fail_on: Option<PackageIdentity>,
    cancel_on: Option<(PackageIdentity, CancellationToken)>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_package(mut self, package: PackageMetadata) -> Self {
        self.packages.push(package);
        self
    }

    pub(crate) fn with_archive(mut self, id: &str, version: &str, bytes: &[u8]) -> Self {
        let identity = PackageIdentity::parse(id, version).unwrap();
        self.archives.insert(identity, bytes.to_vec());
        self
    }

    /// Make metadata lookups of `id` at `version` fail with a network error
    pub(crate) fn failing_on(mut self, id: &str, version: &str) -> Self {
        self.fail_on = Some(PackageIdentity::parse(id, version).unwrap());
        self
    }

    /// Cancel `token` while serving the metadata lookup of `id` at `version`.
    ///
    /// The lookup itself still succeeds.
    pub(crate) fn cancelling_on(
        mut self,
        id: &str,
        version: &str,
        token: &CancellationToken,
    ) -> Self {
        self.cancel_on = Some((PackageIdentity::parse(id, version).unwrap(), token.clone()));
        self
    }

    /// Every call made so far, e.g. `"get_metadata_for Alpha.2.0.0"`
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Identities fetched through `get_metadata_for`, in call order
    pub(crate) fn fetched(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix("get_metadata_for ").map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn versions_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a PackageMetadata> + 'a {
        self.packages
            .iter()
            .filter(move |p| p.id().eq_ignore_ascii_case(id))
    }
}

impl SourceRepository for FakeRepository {
    type Metadata = FakeRepository;
    type FindById = FakeRepository;
    type Search = FakeRepository;

    async fn metadata_resource(&self, _cancel: &CancellationToken) -> RegistryResult<Self> {
        Ok(self.clone())
    }

    async fn find_by_id_resource(&self, _cancel: &CancellationToken) -> RegistryResult<Self> {
        Ok(self.clone())
    }

    async fn search_resource(&self, _cancel: &CancellationToken) -> RegistryResult<Self> {
        Ok(self.clone())
    }
}

impl PackageMetadataResource for FakeRepository {
    async fn get_metadata(
        &self,
        id: &str,
        include_prerelease: bool,
        include_unlisted: bool,
        cache: &SourceCacheContext,
        _cancel: &CancellationToken,
    ) -> RegistryResult<Vec<PackageMetadata>> {
        assert!(cache.no_cache());
        self.record(format!(
            "get_metadata {} prerelease={} unlisted={}",
            id, include_prerelease, include_unlisted
        ));

        Ok(self
            .versions_of(id)
            .filter(|p| include_prerelease || !p.version().is_prerelease())
            .filter(|p| include_unlisted || p.listed)
            .cloned()
            .collect())
    }

    async fn get_metadata_for(
        &self,
        identity: &PackageIdentity,
        cache: &SourceCacheContext,
        _cancel: &CancellationToken,
    ) -> RegistryResult<Option<PackageMetadata>> {
        assert!(cache.no_cache());
        self.record(format!("get_metadata_for {}", identity));

        if self.fail_on.as_ref() == Some(identity) {
            return Err(NugetError::Network {
                message: format!("Registry unavailable for {}", identity),
                source: None,
            });
        }
        if let Some((target, token)) = &self.cancel_on {
            if target == identity {
                token.cancel();
            }
        }

        Ok(self.packages.iter().find(|p| &p.identity == identity).cloned())
    }
}

impl FindPackageByIdResource for FakeRepository {
    async fn copy_nupkg_to_writer<W>(
        &self,
        id: &str,
        version: &Version,
        destination: &mut W,
        cache: &SourceCacheContext,
        _cancel: &CancellationToken,
    ) -> RegistryResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        assert!(cache.direct_download());
        self.record(format!("copy_nupkg {} {}", id, version));

        let identity = PackageIdentity::new(id, version.clone());
        if let Some(bytes) = self.archives.get(&identity) {
            destination
                .write_all(bytes)
                .await
                .map_err(|e| NugetError::io("Failed to write archive".to_string(), e))?;
        }
        Ok(())
    }

    async fn get_all_versions(
        &self,
        id: &str,
        _cache: &SourceCacheContext,
        _cancel: &CancellationToken,
    ) -> RegistryResult<Vec<Version>> {
        self.record(format!("get_all_versions {}", id));
        Ok(self.versions_of(id).map(|p| p.version().clone()).collect())
    }

    async fn does_package_exist(
        &self,
        id: &str,
        version: &Version,
        _cache: &SourceCacheContext,
        _cancel: &CancellationToken,
    ) -> RegistryResult<bool> {
        self.record(format!("does_package_exist {} {}", id, version));
        Ok(self.versions_of(id).any(|p| p.version() == version))
    }
}

impl PackageSearchResource for FakeRepository {
    async fn search(
        &self,
        term: &str,
        filter: SearchFilter,
        skip: usize,
        take: usize,
        _cancel: &CancellationToken,
    ) -> RegistryResult<Vec<PackageMetadata>> {
        self.record(format!(
            "search {} prerelease={} skip={} take={}",
            term, filter.include_prerelease, skip, take
        ));

        let term = term.to_ascii_lowercase();
        Ok(self
            .packages
            .iter()
            .filter(|p| p.id().to_ascii_lowercase().contains(&term))
            .filter(|p| filter.include_prerelease || !p.version().is_prerelease())
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }
}

/// `.NETStandard,Version=v2.0`
pub(crate) fn netstandard20() -> TargetFramework {
    TargetFramework::standard("2.0").unwrap()
}

/// Package metadata with no authors or dependencies
pub(crate) fn package(id: &str, version: &str) -> PackageMetadata {
    PackageMetadata::new(PackageIdentity::parse(id, version).unwrap())
}

/// Group for `framework` whose dependencies are `(id, range)` pairs
pub(crate) fn group(framework: TargetFramework, dependencies: &[(&str, &str)]) -> DependencyGroup {
    dependencies
        .iter()
        .fold(DependencyGroup::new(framework), |group, (id, range)| {
            group.with_dependency(id, VersionRange::parse(range).unwrap())
        })
}
