//! Per-call cache context

use reqwest::header::{HeaderValue, CACHE_CONTROL};
use reqwest::RequestBuilder;
use tracing::trace;

/// Caching behaviour for a single registry resource call.
///
/// A context is acquired right before a resource call and dropped when the
/// call's scope ends, on success, not-found and error alike.
#[derive(Debug)]
pub struct SourceCacheContext {
    /// Bypass any HTTP caches between the client and the registry
    no_cache: bool,
    /// Stream archives straight to the destination
    direct_download: bool,
}

impl SourceCacheContext {
    /// Create a context with explicit settings
    pub fn new(no_cache: bool, direct_download: bool) -> Self {
        trace!(no_cache, direct_download, "cache context acquired");
        Self {
            no_cache,
            direct_download,
        }
    }

    /// Context used by every client operation: never reuse cached data
    pub fn for_request() -> Self {
        Self::new(true, true)
    }

    pub fn no_cache(&self) -> bool {
        self.no_cache
    }

    pub fn direct_download(&self) -> bool {
        self.direct_download
    }

    /// Apply the context to an outgoing request
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        if self.no_cache {
            request.header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
        } else {
            request
        }
    }
}

impl Default for SourceCacheContext {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl Drop for SourceCacheContext {
    fn drop(&mut self) {
        trace!(no_cache = self.no_cache, "cache context released");
    }
}
