//! NuGet version type.
//!
//! A NuGet version has one to four numeric components
//! (`major.minor.patch.revision`), optional dot-separated prerelease labels
//! and optional build metadata. Missing numeric components are zero.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::NugetError;

/// NuGet version (major.minor.patch[.revision][-prerelease][+metadata])
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub revision: u64,
    pub prerelease: Option<String>,
    pub metadata: Option<String>,
}

impl Version {
    /// Create a new release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: 0,
            prerelease: None,
            metadata: None,
        }
    }

    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self, NugetError> {
        input.parse()
    }

    /// Attach prerelease labels
    pub fn with_prerelease(mut self, prerelease: &str) -> Self {
        self.prerelease = Some(prerelease.to_string());
        self
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Normalized string including build metadata
    pub fn to_full_string(&self) -> String {
        match &self.metadata {
            Some(metadata) => format!("{}+{}", self, metadata),
            None => self.to_string(),
        }
    }

    /// Normalized lowercase form used in registry URLs
    pub fn to_normalized_lowercase(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }

    /// Get the precedence for comparison (ignores build metadata)
    fn precedence_cmp(&self, other: &Self) -> Ordering {
        let ours = (self.major, self.minor, self.patch, self.revision);
        let theirs = (other.major, other.minor, other.patch, other.revision);
        match ours.cmp(&theirs) {
            Ordering::Equal => match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less, // prerelease < release
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            },
            other => other,
        }
    }
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_label(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            },
        }
    }
}

fn compare_label(x: &str, y: &str) -> Ordering {
    match (x.parse::<u64>(), y.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => x
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .cmp(y.chars().map(|c| c.to_ascii_lowercase())),
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl FromStr for Version {
    type Err = NugetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason: &str| NugetError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("version cannot be empty"));
        }

        // Split on '+' for build metadata
        let (version_part, metadata) = match input.split_once('+') {
            Some((v, m)) => {
                if !m.split('.').all(is_valid_label) {
                    return Err(invalid("malformed build metadata"));
                }
                (v, Some(m.to_string()))
            },
            None => (input, None),
        };

        // Split on the first '-' for prerelease
        let (core_part, prerelease) = match version_part.split_once('-') {
            Some((c, p)) => {
                if !p.split('.').all(is_valid_label) {
                    return Err(invalid("malformed prerelease label"));
                }
                (c, Some(p.to_string()))
            },
            None => (version_part, None),
        };

        let parts: Vec<&str> = core_part.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return Err(invalid("expected one to four numeric components"));
        }

        let mut numbers = [0u64; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("numeric component expected"));
            }
            *slot = part.parse().map_err(|_| invalid("numeric component out of range"))?;
        }

        Ok(Version {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            revision: numbers[3],
            prerelease,
            metadata,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = NugetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_full_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;

        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }

        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }

        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.precedence_cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch, self.revision).hash(state);
        // Must agree with compare_label: numeric labels by value, others caseless
        if let Some(pre) = &self.prerelease {
            for label in pre.split('.') {
                match label.parse::<u64>() {
                    Ok(n) => n.hash(state),
                    Err(_) => label.to_ascii_lowercase().hash(state),
                }
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_cmp(other)
    }
}
