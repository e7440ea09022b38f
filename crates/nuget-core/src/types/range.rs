//! Version ranges in NuGet interval notation.
//!
//! `1.0` means `>= 1.0`, `[1.0]` is an exact match, and bracketed intervals
//! such as `[1.0, 2.0)` or `(, 3.0]` bound one or both ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Version;
use crate::error::NugetError;

/// Declared range of acceptable versions for a dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    min: Option<Version>,
    min_inclusive: bool,
    max: Option<Version>,
    max_inclusive: bool,
}

impl VersionRange {
    /// Range accepting every version
    pub fn all() -> Self {
        Self {
            min: None,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
        }
    }

    /// Range `>= version`
    pub fn at_least(version: Version) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    /// Range `[version]`
    pub fn exact(version: Version) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
        }
    }

    /// Parse a range string
    pub fn parse(input: &str) -> Result<Self, NugetError> {
        input.parse()
    }

    /// Lower bound of the range, if any
    pub fn min_version(&self) -> Option<&Version> {
        self.min.as_ref()
    }

    /// Upper bound of the range, if any
    pub fn max_version(&self) -> Option<&Version> {
        self.max.as_ref()
    }

    pub fn is_min_inclusive(&self) -> bool {
        self.min.is_some() && self.min_inclusive
    }

    pub fn is_max_inclusive(&self) -> bool {
        self.max.is_some() && self.max_inclusive
    }

    /// Check whether a version falls inside the range
    pub fn satisfies(&self, version: &Version) -> bool {
        let above_min = match &self.min {
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
            None => true,
        };
        let below_max = match &self.max {
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
            None => true,
        };
        above_min && below_max
    }
}

impl FromStr for VersionRange {
    type Err = NugetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = || NugetError::InvalidVersionRange {
            input: input.to_string(),
        };

        let min_inclusive = match input.chars().next() {
            Some('[') => true,
            Some('(') => false,
            Some(_) => {
                // Bare version means minimum inclusive
                let version = Version::parse(input).map_err(|_| invalid())?;
                return Ok(Self::at_least(version));
            },
            None => return Err(invalid()),
        };

        let max_inclusive = match input.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid()),
        };

        if input.len() < 2 {
            return Err(invalid());
        }
        let inner = &input[1..input.len() - 1];

        let bound = |text: &str| -> Result<Option<Version>, NugetError> {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                Version::parse(text).map(Some).map_err(|_| invalid())
            }
        };

        match inner.split_once(',') {
            None => {
                // Only "[x]" is valid without a comma
                if !(min_inclusive && max_inclusive) {
                    return Err(invalid());
                }
                let version = bound(inner)?.ok_or_else(invalid)?;
                Ok(Self::exact(version))
            },
            Some((left, right)) => {
                if right.contains(',') {
                    return Err(invalid());
                }
                let min = bound(left)?;
                let max = bound(right)?;
                if let (Some(lo), Some(hi)) = (&min, &max) {
                    let empty = lo > hi || (lo == hi && !(min_inclusive && max_inclusive));
                    if empty {
                        return Err(invalid());
                    }
                }
                Ok(Self {
                    min_inclusive: min_inclusive && min.is_some(),
                    max_inclusive: max_inclusive && max.is_some(),
                    min,
                    max,
                })
            },
        }
    }
}

impl TryFrom<String> for VersionRange {
    type Error = NugetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            if min == max && self.min_inclusive && self.max_inclusive {
                return write!(f, "[{}]", min);
            }
        }

        f.write_str(if self.is_min_inclusive() { "[" } else { "(" })?;
        if let Some(min) = &self.min {
            write!(f, "{}", min)?;
        }
        f.write_str(", ")?;
        if let Some(max) = &self.max {
            write!(f, "{}", max)?;
        }
        f.write_str(if self.is_max_inclusive() { "]" } else { ")" })
    }
}
