//! Cached provider implementation
//!
//! A caching wrapper for providers that stores search results in a local
//! cache, so repeated searches for the same file skip the catalog.

use super::{Provider, ProviderError};
use crate::cache::CacheStorage;
use crate::language::Language;
use crate::media::MediaDescriptor;
use crate::subtitle::Subtitle;
use std::collections::BTreeSet;
use tracing::debug;

/// A caching wrapper for providers
///
/// Only search results are cached; downloads always go to the wrapped
/// provider. Cache failures never fail a search.
pub struct CachedProvider<P>
where
    P: Provider,
{
    /// The underlying provider
    provider: P,
    /// Cache storage for search results
    cache: CacheStorage<Vec<Subtitle>>,
}

impl<P> CachedProvider<P>
where
    P: Provider,
{
    /// Creates a new cached provider wrapping the given provider
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let subscene = SubsceneProvider::new(ProviderConfig::default());
    /// let cache = CacheStorage::open("searches", Some(Duration::from_secs(3600)))?;
    /// let cached = CachedProvider::new(subscene, cache);
    /// ```
    pub fn new(provider: P, cache: CacheStorage<Vec<Subtitle>>) -> Self {
        Self { provider, cache }
    }

    /// Generates a cache key for a search
    ///
    /// The key combines the provider and its scope, the media file's base
    /// name and the requested languages in sorted order.
    fn cache_key(&self, descriptor: &MediaDescriptor, languages: &BTreeSet<Language>) -> String {
        format!(
            "{}_{}_{}_{}",
            self.provider.name(),
            self.provider.cache_scope(),
            descriptor.base_name(),
            languages
                .iter()
                .map(Language::alpha3)
                .collect::<Vec<_>>()
                .join("_")
        )
    }
}

impl<P> Provider for CachedProvider<P>
where
    P: Provider,
{
    fn name(&self) -> &'static str {
        self.provider.name()
    }

    fn cache_scope(&self) -> String {
        self.provider.cache_scope()
    }

    fn languages(&self) -> BTreeSet<Language> {
        self.provider.languages()
    }

    fn initialize(&mut self) -> Result<(), ProviderError> {
        self.provider.initialize()
    }

    fn terminate(&mut self) {
        self.provider.terminate();
    }

    fn list_subtitles(
        &mut self,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        let cache_key = self.cache_key(descriptor, languages);

        match self.cache.load(&cache_key) {
            Ok(Some(subtitles)) => {
                debug!("Using cached search results for '{}'", cache_key);
                return Ok(subtitles);
            }
            Ok(None) => {}
            Err(e) => debug!("Ignoring unreadable cache entry: {}", e),
        }

        let subtitles = self.provider.list_subtitles(descriptor, languages)?;

        if let Err(e) = self.cache.store(&cache_key, &subtitles) {
            debug!("Could not cache search results: {}", e);
        }

        Ok(subtitles)
    }

    fn download_subtitle(&mut self, subtitle: &mut Subtitle) -> Result<(), ProviderError> {
        self.provider.download_subtitle(subtitle)
    }
}
