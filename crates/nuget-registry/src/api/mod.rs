//! NuGet V3 API response types

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use nuget_core::types::{
    DependencyGroup, PackageDependency, PackageIdentity, PackageMetadata, TargetFramework,
    Version, VersionRange,
};
use nuget_core::error::NugetError;
use crate::RegistryResult;

/// Service index (`index.json`) listing the resources of a source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceIndex {
    /// Protocol version (e.g. "3.0.0")
    pub version: String,
    /// Advertised resources
    #[serde(default)]
    pub resources: Vec<ServiceResource>,
}

/// One resource entry of the service index
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceResource {
    /// Resource base URL
    #[serde(rename = "@id")]
    pub id: String,
    /// Resource type, e.g. "PackageBaseAddress/3.0.0"
    #[serde(rename = "@type")]
    pub resource_type: String,
}

impl ServiceIndex {
    /// First resource URL matching the given types, in preference order
    pub fn find(&self, types: &[&str]) -> Option<&str> {
        types.iter().find_map(|wanted| {
            self.resources
                .iter()
                .find(|r| r.resource_type == *wanted)
                .map(|r| r.id.as_str())
        })
    }
}

/// Registration index for one package id
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationIndex {
    /// Number of pages
    #[serde(default)]
    pub count: usize,
    /// Registration pages
    #[serde(default)]
    pub items: Vec<RegistrationPage>,
}

/// Page of registration leaves, inlined or referenced by URL
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationPage {
    /// Page URL
    #[serde(rename = "@id")]
    pub id: String,
    /// Lowest version on the page
    pub lower: Option<String>,
    /// Highest version on the page
    pub upper: Option<String>,
    /// Inlined leaves; absent when the page must be fetched
    pub items: Option<Vec<RegistrationLeaf>>,
}

impl RegistrationPage {
    /// Whether `version` can be on this page, judging by its bounds
    pub fn may_contain(&self, version: &Version) -> bool {
        let bound = |text: &Option<String>| text.as_deref().and_then(|t| Version::parse(t).ok());
        let above = bound(&self.lower).map_or(true, |lower| version >= &lower);
        let below = bound(&self.upper).map_or(true, |upper| version <= &upper);
        above && below
    }
}

/// Registration leaf wrapping one catalog entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationLeaf {
    /// Package details
    #[serde(rename = "catalogEntry")]
    pub catalog_entry: CatalogEntry,
    /// Archive download URL
    #[serde(rename = "packageContent")]
    pub package_content: Option<String>,
}

/// Either a single (comma separated) string or a list of strings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl Default for StringOrList {
    fn default() -> Self {
        StringOrList::Many(Vec::new())
    }
}

impl StringOrList {
    /// Flatten into trimmed, non-empty entries, splitting on `separator`
    pub fn into_list(self, separator: char) -> Vec<String> {
        let raw = match self {
            StringOrList::One(s) => vec![s],
            StringOrList::Many(v) => v,
        };
        raw.iter()
            .flat_map(|s| s.split(separator))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Package details from the registration catalog entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogEntry {
    /// Package id
    pub id: String,
    /// Package version
    pub version: String,
    /// Authors, comma separated on the wire
    #[serde(default)]
    pub authors: StringOrList,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: StringOrList,
    #[serde(rename = "projectUrl")]
    pub project_url: Option<String>,
    #[serde(rename = "licenseUrl")]
    pub license_url: Option<String>,
    pub listed: Option<bool>,
    pub published: Option<String>,
    /// Dependencies grouped by target framework
    #[serde(rename = "dependencyGroups", default)]
    pub dependency_groups: Vec<DependencyGroupEntry>,
}

/// Dependency group on the wire
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyGroupEntry {
    /// Absent for groups that apply to every framework
    #[serde(rename = "targetFramework")]
    pub target_framework: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

/// Single dependency on the wire
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyEntry {
    pub id: String,
    pub range: Option<String>,
}

/// Flat container version list (`{id}/index.json`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlatContainerVersions {
    #[serde(default)]
    pub versions: Vec<String>,
}

/// Search query service response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(rename = "totalHits", default)]
    pub total_hits: u64,
    #[serde(default)]
    pub data: Vec<SearchResult>,
}

/// One search hit
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub version: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub authors: StringOrList,
    #[serde(default)]
    pub tags: StringOrList,
    #[serde(rename = "projectUrl")]
    pub project_url: Option<String>,
    #[serde(rename = "licenseUrl")]
    pub license_url: Option<String>,
    #[serde(rename = "totalDownloads")]
    pub total_downloads: Option<u64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_version(id: &str, version: &str) -> RegistryResult<Version> {
    Version::parse(version).map_err(|e| {
        NugetError::protocol(format!("registry returned invalid version for {}: {}", id, e))
    })
}

fn parse_published(published: Option<&str>) -> Option<DateTime<Utc>> {
    published
        .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
        .map(|p| p.with_timezone(&Utc))
}

impl CatalogEntry {
    /// Convert into client metadata
    pub fn into_metadata(self) -> RegistryResult<PackageMetadata> {
        let version = parse_version(&self.id, &self.version)?;
        let published = parse_published(self.published.as_deref());
        // The registry marks unlisted packages with a 1900 publish date
        let listed = self.listed.unwrap_or(true)
            && published.map_or(true, |p| p.year() != 1900);

        let dependency_groups = self
            .dependency_groups
            .into_iter()
            .filter_map(|group| group.into_group(&self.id))
            .collect();

        Ok(PackageMetadata {
            identity: PackageIdentity::new(self.id, version),
            title: non_empty(self.title),
            description: non_empty(self.description),
            summary: non_empty(self.summary),
            authors: self.authors.into_list(','),
            tags: self.tags.into_list(' '),
            project_url: non_empty(self.project_url),
            license_url: non_empty(self.license_url),
            download_count: None,
            listed,
            published,
            dependency_groups,
        })
    }
}

impl DependencyGroupEntry {
    fn into_group(self, package_id: &str) -> Option<DependencyGroup> {
        let target_framework = match TargetFramework::from_name(self.target_framework.as_deref()) {
            Ok(framework) => framework,
            Err(e) => {
                warn!("Skipping dependency group of {}: {}", package_id, e);
                return None;
            },
        };

        let packages = self
            .dependencies
            .into_iter()
            .map(|dep| {
                let version_range = match dep.range.as_deref().map(str::trim) {
                    None | Some("") => VersionRange::all(),
                    Some(range) => VersionRange::parse(range).unwrap_or_else(|e| {
                        warn!("Unbounded range for {} -> {}: {}", package_id, dep.id, e);
                        VersionRange::all()
                    }),
                };
                PackageDependency {
                    id: dep.id,
                    version_range,
                }
            })
            .collect();

        Some(DependencyGroup {
            target_framework,
            packages,
        })
    }
}

impl SearchResult {
    /// Convert into client metadata (search hits carry no dependencies)
    pub fn into_metadata(self) -> RegistryResult<PackageMetadata> {
        let version = parse_version(&self.id, &self.version)?;
        let mut metadata = PackageMetadata::new(PackageIdentity::new(self.id, version));
        metadata.title = non_empty(self.title);
        metadata.description = non_empty(self.description);
        metadata.summary = non_empty(self.summary);
        metadata.authors = self.authors.into_list(',');
        metadata.tags = self.tags.into_list(' ');
        metadata.project_url = non_empty(self.project_url);
        metadata.license_url = non_empty(self.license_url);
        metadata.download_count = self.total_downloads;
        Ok(metadata)
    }
}
