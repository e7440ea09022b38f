//! Dependency closure resolution
//!
//! Walks the dependency groups of a root package that match the requested
//! target framework exactly, resolving every dependency at the lower bound of
//! its version range. The result is a depth-first pre-order flattening of
//! the dependency tree:
//!
//! - siblings within a group are visited in ordinal id order
//! - each package is followed by its own dependencies before the next sibling
//! - a package authored by an ignored author is dropped with its subtree
//! - a package reached through two branches appears once per branch

use std::vec;

use tracing::{debug, trace, warn};

use nuget_core::error::NugetError;
use nuget_core::types::{PackageDependency, PackageIdentity, PackageMetadata, TargetFramework};
use nuget_registry::{CancellationToken, SourceRepository};

use crate::client::NugetPackageClient;
use crate::contract::{DependenciesRequest, RootPackage};
use crate::ClientResult;

/// One package on the current path with the dependencies still to visit
struct Frame {
    identity: PackageIdentity,
    pending: vec::IntoIter<PackageDependency>,
}

impl Frame {
    fn new(package: &PackageMetadata, framework: &TargetFramework) -> Self {
        let pending: Vec<PackageDependency> = package
            .dependency_groups_for(framework)
            .flat_map(|group| group.packages_by_id().into_iter().cloned())
            .collect();

        Self {
            identity: package.identity.clone(),
            pending: pending.into_iter(),
        }
    }
}

/// Resolver for a single [`DependenciesRequest`]
pub struct DependencyResolver<'a, R> {
    client: &'a NugetPackageClient<R>,
    request: &'a DependenciesRequest,
}

impl<'a, R: SourceRepository> DependencyResolver<'a, R> {
    pub fn new(client: &'a NugetPackageClient<R>, request: &'a DependenciesRequest) -> Self {
        Self { client, request }
    }

    /// Resolve the closure.
    ///
    /// Registry failures abort the walk; no partial result is returned.
    pub async fn resolve(&self, cancel: &CancellationToken) -> ClientResult<Vec<PackageMetadata>> {
        let Some(root) = self.root_package(cancel).await? else {
            debug!("Root package {} not found", self.request.root().identity());
            return Ok(Vec::new());
        };

        let framework = self.request.target_framework();
        let ignore_authors = self.request.ignore_authors();

        let mut results = Vec::new();
        let mut stack = vec![Frame::new(&root, framework)];
        if self.request.add_root_to_results() {
            results.push(root);
        }

        while let Some(frame) = stack.last_mut() {
            let Some(dependency) = frame.pending.next() else {
                stack.pop();
                continue;
            };

            let Some(min_version) = dependency.min_version() else {
                warn!(
                    "Skipping {} {}: range has no lower bound",
                    dependency.id, dependency.version_range
                );
                continue;
            };
            let identity = PackageIdentity::new(dependency.id.as_str(), min_version.clone());

            if let Some(start) = stack.iter().position(|f| f.identity == identity) {
                return Err(NugetError::CircularDependency {
                    cycle: format_cycle(&stack[start..], &identity),
                });
            }

            if cancel.is_cancelled() {
                return Err(NugetError::Cancelled);
            }

            let Some(package) = self.client.get_by_identity(&identity, cancel).await? else {
                warn!("Skipping {}: not found in registry", identity);
                continue;
            };

            if package.has_author_matching(ignore_authors) {
                debug!(authors = ?package.authors, "Ignoring {} and its dependencies", identity);
                continue;
            }

            trace!(depth = stack.len(), "Resolved {}", package.identity);
            stack.push(Frame::new(&package, framework));
            results.push(package);
        }

        debug!(count = results.len(), "Resolved dependencies of {}", self.request.root().identity());
        Ok(results)
    }

    async fn root_package(&self, cancel: &CancellationToken) -> ClientResult<Option<PackageMetadata>> {
        match self.request.root() {
            RootPackage::Package(package) => Ok(Some(package.as_ref().clone())),
            RootPackage::Identity(identity) => self.client.get_by_identity(identity, cancel).await,
        }
    }
}

/// Format a cycle as "a -> b -> a"
fn format_cycle(path: &[Frame], repeated: &PackageIdentity) -> String {
    path.iter()
        .map(|frame| frame.identity.to_string())
        .chain(std::iter::once(repeated.to_string()))
        .collect::<Vec<_>>()
        .join(" -> ")
}
