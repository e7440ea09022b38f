//! Package archive file names.

use crate::error::{NugetError, NugetResult};
use crate::types::Version;

/// Extension of package archives
pub const NUPKG_EXTENSION: &str = "nupkg";

/// Build `{id}.{version}.nupkg`
pub fn nupkg_file_name(id: &str, version: &str) -> NugetResult<String> {
    if id.is_empty() {
        return Err(NugetError::invalid_argument("id", "Package ID cannot be null or empty"));
    }
    if version.is_empty() {
        return Err(NugetError::invalid_argument(
            "version",
            "Package version cannot be null or empty",
        ));
    }

    Ok(format!("{}.{}.{}", id, version, NUPKG_EXTENSION))
}

/// Build the file name from a parsed version (normalized form)
pub fn nupkg_file_name_for(id: &str, version: &Version) -> NugetResult<String> {
    nupkg_file_name(id, &version.to_string())
}
