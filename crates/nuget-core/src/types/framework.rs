//! Target framework monikers.
//!
//! Frameworks are compared by exact value: identifier, four-part version and
//! profile. No compatibility reduction is performed, so `netstandard2.0`
//! never matches a `.NETStandard1.6` dependency group.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::NugetError;

pub const NET_FRAMEWORK: &str = ".NETFramework";
pub const NET_STANDARD: &str = ".NETStandard";
pub const NET_CORE_APP: &str = ".NETCoreApp";
pub const ANY_FRAMEWORK: &str = "Any";

/// Parsed target framework (e.g. `.NETStandard,Version=v2.0`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetFramework {
    identifier: String,
    version: [u32; 4],
    profile: Option<String>,
}

impl TargetFramework {
    /// Build a framework from its parts
    pub fn new(identifier: &str, version: &str) -> Result<Self, NugetError> {
        Ok(Self {
            identifier: identifier.to_string(),
            version: parse_dotted_version(version).ok_or_else(|| NugetError::InvalidFramework {
                input: format!("{},Version={}", identifier, version),
            })?,
            profile: None,
        })
    }

    /// `.NETStandard` at the given version, e.g. `standard("2.0")`
    pub fn standard(version: &str) -> Result<Self, NugetError> {
        Self::new(NET_STANDARD, version)
    }

    /// `.NETFramework` at the given version, e.g. `framework("4.5")`
    pub fn framework(version: &str) -> Result<Self, NugetError> {
        Self::new(NET_FRAMEWORK, version)
    }

    /// Framework of dependency groups that apply to every target
    pub fn any() -> Self {
        Self {
            identifier: ANY_FRAMEWORK.to_string(),
            version: [0; 4],
            profile: None,
        }
    }

    /// Parse an optional framework name; an absent name means any framework
    pub fn from_name(name: Option<&str>) -> Result<Self, NugetError> {
        match name {
            Some(name) if !name.trim().is_empty() => name.parse(),
            _ => Ok(Self::any()),
        }
    }

    /// Attach a profile (e.g. `Client`)
    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn version(&self) -> [u32; 4] {
        self.version
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn is_any(&self) -> bool {
        self.identifier.eq_ignore_ascii_case(ANY_FRAMEWORK)
    }

    fn parse_full_name(input: &str) -> Option<Self> {
        let mut parts = input.split(',');
        let identifier = parts.next()?.trim();
        if identifier.is_empty() {
            return None;
        }

        let mut version = None;
        let mut profile = None;
        for part in parts {
            let (key, value) = part.split_once('=')?;
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => {
                    let value = value.strip_prefix(['v', 'V']).unwrap_or(value);
                    version = Some(parse_dotted_version(value)?);
                },
                "profile" if !value.is_empty() => profile = Some(value.to_string()),
                "profile" => {},
                _ => return None,
            }
        }

        Some(Self {
            identifier: identifier.to_string(),
            version: version.unwrap_or([0; 4]),
            profile,
        })
    }

    /// Registration style, e.g. `.NETStandard2.0`
    fn parse_dotted_identifier(input: &str) -> Option<Self> {
        let split = input
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(input.len());
        let (identifier, version) = input.split_at(split);
        let version = if version.is_empty() {
            [0; 4]
        } else {
            parse_dotted_version(version)?
        };

        Some(Self {
            identifier: identifier.to_string(),
            version,
            profile: None,
        })
    }

    /// Short folder name, e.g. `netstandard2.0`, `net45`, `net5.0`
    fn parse_short_name(input: &str) -> Option<Self> {
        let (name, profile) = match input.split_once('-') {
            Some((name, profile)) if !profile.is_empty() => (name, Some(capitalize(profile))),
            Some(_) => return None,
            None => (input, None),
        };

        let lower = name.to_ascii_lowercase();
        let split = lower
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(lower.len());
        let (moniker, digits) = lower.split_at(split);

        let version = if digits.is_empty() {
            [0; 4]
        } else if digits.contains('.') {
            parse_dotted_version(digits)?
        } else {
            parse_compact_version(digits)?
        };

        let identifier = match moniker {
            "netstandard" => NET_STANDARD.to_string(),
            "netcoreapp" => NET_CORE_APP.to_string(),
            "net" if version[0] >= 5 => NET_CORE_APP.to_string(),
            "net" => NET_FRAMEWORK.to_string(),
            "any" => ANY_FRAMEWORK.to_string(),
            "" => return None,
            other => other.to_string(),
        };

        Some(Self {
            identifier,
            version,
            profile,
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `2.0`, `4.6.1` -> four components
fn parse_dotted_version(text: &str) -> Option<[u32; 4]> {
    let parts: Vec<&str> = text.trim().split('.').collect();
    if parts.is_empty() || parts.len() > 4 {
        return None;
    }
    let mut version = [0u32; 4];
    for (slot, part) in version.iter_mut().zip(&parts) {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    Some(version)
}

/// `45`, `462` -> one digit per component
fn parse_compact_version(digits: &str) -> Option<[u32; 4]> {
    if digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut version = [0u32; 4];
    for (slot, digit) in version.iter_mut().zip(digits.chars()) {
        *slot = digit.to_digit(10)?;
    }
    Some(version)
}

impl FromStr for TargetFramework {
    type Err = NugetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parsed = if input.is_empty() {
            None
        } else if input.contains(',') {
            Self::parse_full_name(input)
        } else if input.starts_with('.') {
            Self::parse_dotted_identifier(input)
        } else {
            Self::parse_short_name(input)
        };

        parsed.ok_or_else(|| NugetError::InvalidFramework {
            input: input.to_string(),
        })
    }
}

impl TryFrom<String> for TargetFramework {
    type Error = NugetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetFramework> for String {
    fn from(framework: TargetFramework) -> Self {
        framework.to_string()
    }
}

impl PartialEq for TargetFramework {
    fn eq(&self, other: &Self) -> bool {
        self.identifier.eq_ignore_ascii_case(&other.identifier)
            && self.version == other.version
            && match (&self.profile, &other.profile) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
    }
}

impl Eq for TargetFramework {}

impl Hash for TargetFramework {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.to_ascii_lowercase().hash(state);
        self.version.hash(state);
        self.profile
            .as_ref()
            .map(|p| p.to_ascii_lowercase())
            .hash(state);
    }
}

impl fmt::Display for TargetFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, build, revision] = self.version;
        write!(f, "{},Version=v{}.{}", self.identifier, major, minor)?;
        if build > 0 || revision > 0 {
            write!(f, ".{}", build)?;
        }
        if revision > 0 {
            write!(f, ".{}", revision)?;
        }
        if let Some(profile) = &self.profile {
            write!(f, ",Profile={}", profile)?;
        }
        Ok(())
    }
}
