//! Package identity: id plus exact version.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::Version;
use crate::error::{NugetError, NugetResult};

/// Unique identifier for a published package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Package id as published (e.g. "Newtonsoft.Json")
    pub id: String,
    /// Exact version
    pub version: Version,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Reject an empty package id
    pub fn validate_id(id: &str) -> NugetResult<()> {
        if id.is_empty() {
            return Err(NugetError::invalid_argument("id", "Package ID cannot be null or empty."));
        }
        Ok(())
    }

    /// Validate and parse an id/version pair
    pub fn parse(id: &str, version: &str) -> NugetResult<Self> {
        Self::validate_id(id)?;
        if version.is_empty() {
            return Err(NugetError::invalid_argument(
                "version",
                "Package version cannot be null or empty.",
            ));
        }
        Ok(Self::new(id, Version::parse(version)?))
    }

    /// Lowercase id used in registry URLs
    pub fn lower_id(&self) -> String {
        self.id.to_ascii_lowercase()
    }
}

impl PartialEq for PackageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id) && self.version == other.version
    }
}

impl Eq for PackageIdentity {}

impl Hash for PackageIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.to_ascii_lowercase().hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.version)
    }
}
