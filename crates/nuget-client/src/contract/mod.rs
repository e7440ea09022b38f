//! Request value objects.
//!
//! Requests validate their inputs on construction, so an invalid request
//! never reaches the registry.

use indexmap::IndexSet;

use nuget_core::error::NugetError;
use nuget_core::types::{PackageIdentity, PackageMetadata, TargetFramework};

use crate::ClientResult;

/// Free-text package search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    term: String,
    include_prerelease: bool,
    skip: usize,
    take: usize,
}

impl SearchRequest {
    /// Page size used when none is given
    pub const DEFAULT_TAKE: usize = 20;

    pub fn new(term: &str) -> ClientResult<Self> {
        if term.is_empty() {
            return Err(NugetError::invalid_argument(
                "term",
                "Search term cannot be null or empty.",
            ));
        }

        Ok(Self {
            term: term.to_string(),
            include_prerelease: false,
            skip: 0,
            take: Self::DEFAULT_TAKE,
        })
    }

    pub fn with_prerelease(mut self, include_prerelease: bool) -> Self {
        self.include_prerelease = include_prerelease;
        self
    }

    /// Number of results to skip
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Number of results to return
    pub fn with_take(mut self, take: usize) -> Self {
        self.take = take;
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn include_prerelease(&self) -> bool {
        self.include_prerelease
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn take(&self) -> usize {
        self.take
    }
}

/// Where the dependency walk starts
#[derive(Debug, Clone, PartialEq)]
pub enum RootPackage {
    /// Fetched from the registry before the walk
    Identity(PackageIdentity),
    /// Already fetched by the caller
    Package(Box<PackageMetadata>),
}

impl RootPackage {
    pub fn identity(&self) -> &PackageIdentity {
        match self {
            RootPackage::Identity(identity) => identity,
            RootPackage::Package(package) => &package.identity,
        }
    }
}

/// Dependency closure request
#[derive(Debug, Clone)]
pub struct DependenciesRequest {
    root: RootPackage,
    target_framework: TargetFramework,
    add_root_to_results: bool,
    ignore_authors: IndexSet<String>,
}

impl DependenciesRequest {
    /// Closure of `id` at `version`, fetched from the registry.
    ///
    /// Fails when `id` or `version` is empty or `version` is not a valid
    /// NuGet version.
    pub fn for_package(
        id: &str,
        version: &str,
        target_framework: TargetFramework,
    ) -> ClientResult<Self> {
        let identity = PackageIdentity::parse(id, version)?;
        Ok(Self::new(RootPackage::Identity(identity), target_framework))
    }

    /// Closure of a package the caller already holds
    pub fn from_metadata(package: PackageMetadata, target_framework: TargetFramework) -> Self {
        Self::new(RootPackage::Package(Box::new(package)), target_framework)
    }

    fn new(root: RootPackage, target_framework: TargetFramework) -> Self {
        Self {
            root,
            target_framework,
            add_root_to_results: false,
            ignore_authors: IndexSet::new(),
        }
    }

    /// Put the root package first in the results
    pub fn with_root_in_results(mut self, add_root_to_results: bool) -> Self {
        self.add_root_to_results = add_root_to_results;
        self
    }

    /// Skip packages whose authors contain `author` (case-sensitive)
    pub fn ignore_author(mut self, author: &str) -> Self {
        self.ignore_authors.insert(author.to_string());
        self
    }

    pub fn ignore_authors_mut(&mut self) -> &mut IndexSet<String> {
        &mut self.ignore_authors
    }

    pub fn ignore_authors(&self) -> &IndexSet<String> {
        &self.ignore_authors
    }

    pub fn root(&self) -> &RootPackage {
        &self.root
    }

    pub fn target_framework(&self) -> &TargetFramework {
        &self.target_framework
    }

    pub fn add_root_to_results(&self) -> bool {
        self.add_root_to_results
    }
}
