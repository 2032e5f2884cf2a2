//! The provider seam and its cache-backed entry point.

use async_trait::async_trait;
use serde::Serialize;
use tripmate_core::{fingerprint, SearchParams};

use crate::cache::ResultCache;
use crate::error::SearchError;
use crate::records::SearchKind;

/// An external search backend that yields normalized records.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    type Record: Clone + Send + Sync + Serialize + 'static;

    fn kind(&self) -> SearchKind;

    /// Run one search against the backend. Never consults a cache.
    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Self::Record>, SearchError>;
}

/// Search through `cache`.
///
/// Unless `force_refresh` is set, an exact fingerprint hit is returned without
/// calling the provider. Otherwise the provider is called and non-empty
/// results are written back, so a forced search still refreshes the cache.
pub async fn search_with_cache<P>(
    provider: &P,
    cache: &mut ResultCache<P::Record>,
    params: &SearchParams,
    force_refresh: bool,
) -> Result<Vec<P::Record>, SearchError>
where
    P: SearchProvider + ?Sized,
{
    let key = fingerprint(params);

    if !force_refresh {
        if let Some(entry) = cache.get(&key) {
            tracing::info!(kind = %provider.kind(), key = %key, "Using cached search results");
            return Ok(entry.results.clone());
        }
    }

    tracing::debug!(kind = %provider.kind(), key = %key, force_refresh, "Calling search provider");
    let results = provider.fetch(params).await?;
    tracing::info!(kind = %provider.kind(), count = results.len(), "Search provider returned results");

    if !results.is_empty() {
        cache.put(key, params.clone(), results.clone());
    }
    Ok(results)
}
