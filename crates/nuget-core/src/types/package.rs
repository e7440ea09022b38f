//! Package metadata types.
//!
//! Metadata is produced by the registry; the client only reads and filters
//! it. Dependencies are grouped per target framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PackageIdentity, TargetFramework, Version, VersionRange};
use crate::utils::text::contains_any;

/// Metadata of one published package version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub identity: PackageIdentity,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    pub project_url: Option<String>,
    pub license_url: Option<String>,
    pub download_count: Option<u64>,
    pub listed: bool,
    pub published: Option<DateTime<Utc>>,
    pub dependency_groups: Vec<DependencyGroup>,
}

/// Dependencies declared for one target framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGroup {
    pub target_framework: TargetFramework,
    pub packages: Vec<PackageDependency>,
}

/// Dependency on another package id within a version range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDependency {
    pub id: String,
    pub version_range: VersionRange,
}

impl PackageMetadata {
    /// Create new package metadata with required fields
    pub fn new(identity: PackageIdentity) -> Self {
        Self {
            identity,
            title: None,
            description: None,
            summary: None,
            authors: Vec::new(),
            tags: Vec::new(),
            project_url: None,
            license_url: None,
            download_count: None,
            listed: true,
            published: None,
            dependency_groups: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn version(&self) -> &Version {
        &self.identity.version
    }

    /// Add an author
    pub fn with_author(mut self, author: &str) -> Self {
        self.authors.push(author.to_string());
        self
    }

    /// Add a dependency group
    pub fn with_dependency_group(mut self, group: DependencyGroup) -> Self {
        self.dependency_groups.push(group);
        self
    }

    /// Groups whose framework equals `framework` exactly
    pub fn dependency_groups_for<'a>(
        &'a self,
        framework: &'a TargetFramework,
    ) -> impl Iterator<Item = &'a DependencyGroup> + 'a {
        self.dependency_groups
            .iter()
            .filter(move |group| &group.target_framework == framework)
    }

    /// True when any author contains any of the given names
    pub fn has_author_matching<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a String> + Clone,
    {
        self.authors
            .iter()
            .any(|author| contains_any(author, names.clone()))
    }
}

impl DependencyGroup {
    pub fn new(target_framework: TargetFramework) -> Self {
        Self {
            target_framework,
            packages: Vec::new(),
        }
    }

    /// Add a dependency to the group
    pub fn with_dependency(mut self, id: &str, version_range: VersionRange) -> Self {
        self.packages.push(PackageDependency::new(id, version_range));
        self
    }

    /// Dependencies ordered by id (ordinal comparison)
    pub fn packages_by_id(&self) -> Vec<&PackageDependency> {
        let mut packages: Vec<&PackageDependency> = self.packages.iter().collect();
        packages.sort_by(|a, b| a.id.cmp(&b.id));
        packages
    }
}

impl PackageDependency {
    pub fn new(id: &str, version_range: VersionRange) -> Self {
        Self {
            id: id.to_string(),
            version_range,
        }
    }

    /// Lower bound of the declared range
    pub fn min_version(&self) -> Option<&Version> {
        self.version_range.min_version()
    }
}
