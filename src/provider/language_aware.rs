//! Language and season aware subscene provider
//!
//! Variant of the subscene provider that drops rows in unwanted languages
//! before parsing them, only opens search results naming the wanted season,
//! and keeps season packs of the right season. The title search runs only
//! when `ProviderConfig::extended_search` is set; its results are merged with
//! the release name search.

use super::catalog::{Catalog, CatalogPage, CatalogSession, SEARCH_RESULT};
use super::listing::{self, read_listing};
use super::{Provider, ProviderConfig, ProviderError};
use crate::extraction::{MetadataExtractor, ReleaseNameExtractor, attribute};
use crate::filters::FilterState;
use crate::language::{Language, LanguageResolver, SubsceneLanguages};
use crate::media::MediaDescriptor;
use crate::ordinal::ordinal_words;
use crate::subtitle::Subtitle;
use crate::transport::{Connector, HttpConnector};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Language aware provider for the subscene catalog.
pub struct LanguageAwareSubsceneProvider<C: Connector = HttpConnector> {
    session: CatalogSession<C>,
    resolver: SubsceneLanguages,
    extractor: Box<dyn MetadataExtractor>,
}

impl LanguageAwareSubsceneProvider<HttpConnector> {
    pub fn new(config: ProviderConfig) -> Self {
        let connector = config.connector();
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> LanguageAwareSubsceneProvider<C> {
    pub fn with_connector(config: ProviderConfig, connector: C) -> Self {
        Self {
            session: CatalogSession::new(config, connector),
            resolver: SubsceneLanguages,
            extractor: Box::new(ReleaseNameExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: impl MetadataExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_open()
    }

    pub fn filters(&self) -> &FilterState {
        self.session.filters()
    }

    fn query(
        &mut self,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        let release_name = descriptor.base_name();
        let extended = self.session.config().extended_search;

        let mut subtitles = match self.simple_query(&release_name, descriptor, languages) {
            Ok(subtitles) => subtitles,
            Err(ProviderError::Transport(e)) if extended => {
                warn!("Search for '{}' failed: {}", release_name, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if extended {
            match self.extended_query(descriptor, languages) {
                Ok(found) => {
                    for subtitle in found {
                        if !subtitles.iter().any(|s| s.id() == subtitle.id()) {
                            subtitles.push(subtitle);
                        }
                    }
                }
                // keep what the release name search found
                Err(ProviderError::Transport(e)) if !subtitles.is_empty() => {
                    warn!("Search for '{}' failed: {}", descriptor.search_title(), e);
                }
                Err(e) => return Err(e),
            }
        }

        info!("Totally {} subtitles found", subtitles.len());
        Ok(subtitles)
    }

    fn simple_query(
        &self,
        query: &str,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        let catalog = self.session.catalog()?;
        // only open search results of the wanted season
        let verify_token = descriptor.season().map(ordinal_words);

        let subtitles = listing::search(
            &catalog,
            query,
            &SEARCH_RESULT,
            verify_token.as_deref(),
            |page| self.subtitles_from_page(&catalog, page, descriptor, languages),
        )?;
        Ok(subtitles)
    }

    fn extended_query(
        &mut self,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        info!("Using extended search algorithm");

        self.session.disable_filters();
        let title = descriptor.search_title().to_lowercase();
        let subtitles = self.simple_query(&title, descriptor, languages);
        self.session.enable_filters();

        subtitles
    }

    fn subtitles_from_page(
        &self,
        catalog: &Catalog<'_, C::Session>,
        page: &CatalogPage,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Vec<Subtitle> {
        let listing = read_listing(catalog, page, &self.resolver, Some(languages));
        let mut subtitles = Vec::new();

        for row in &listing.rows {
            let info = self.extractor.extract(&row.name);
            let mut params = row.params(&listing);

            if let (Some(season), Some(episode)) = (descriptor.season(), descriptor.episode_number()) {
                params.is_series = true;

                if info.number(attribute::SEASON) != Some(season) {
                    debug!("Skipping {}, it is not from season {}", row.name, season);
                    continue;
                }

                match info.number(attribute::EPISODE) {
                    None => {
                        params.is_pack = true;
                        params.force_episode = Some(episode);
                        debug!("Accepting subtitle {} because it appears to be a pack", row.name);
                    }
                    Some(found) if found != episode => {
                        debug!("Skipping {}, it is episode {}", row.name, found);
                        continue;
                    }
                    Some(_) => {}
                }
            }

            match Subtitle::language_aware(params, info) {
                Ok(subtitle) => subtitles.push(subtitle),
                Err(e) => debug!("Skipping {} because parsing failed: {}", row.name, e),
            }
        }

        debug!("{} subtitles found", subtitles.len());
        subtitles
    }
}

impl<C: Connector> Provider for LanguageAwareSubsceneProvider<C> {
    fn name(&self) -> &'static str {
        "subscene_language_aware"
    }

    fn cache_scope(&self) -> String {
        self.session.config().cache_scope()
    }

    fn languages(&self) -> BTreeSet<Language> {
        self.resolver.supported()
    }

    fn initialize(&mut self) -> Result<(), ProviderError> {
        self.session.open()
    }

    fn terminate(&mut self) {
        self.session.close();
    }

    fn list_subtitles(
        &mut self,
        descriptor: &MediaDescriptor,
        languages: &BTreeSet<Language>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        if !self.session.is_open() {
            return Err(ProviderError::NotInitialized);
        }

        self.session.apply_filters(languages, &self.resolver);
        let subtitles = self.query(descriptor, languages)?;

        Ok(subtitles
            .into_iter()
            .filter(|s| languages.contains(s.language()))
            .collect())
    }

    fn download_subtitle(&mut self, subtitle: &mut Subtitle) -> Result<(), ProviderError> {
        let catalog = self.session.catalog()?;
        listing::download(&catalog, subtitle)
    }
}
