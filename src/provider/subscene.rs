//! Subscene provider
//!
//! Searches the catalog by the media file's release name first. When that
//! finds nothing, it searches by title with filters disabled, follows the
//! first matching subtitle to the title's canonical page and parses that page
//! with filters enabled again.

use super::catalog::{Catalog, CatalogPage, CatalogSession, SEARCH_RESULTS};
use super::listing::{self, read_listing};
use super::{Provider, ProviderConfig, ProviderError};
use crate::extraction::{MetadataExtractor, ReleaseNameExtractor};
use crate::filters::FilterState;
use crate::language::{Language, LanguageResolver, SubsceneLanguages};
use crate::media::MediaDescriptor;
use crate::subtitle::Subtitle;
use crate::transport::{Connector, HttpConnector};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Provider for the subscene catalog.
pub struct SubsceneProvider<C: Connector = HttpConnector> {
    session: CatalogSession<C>,
    resolver: SubsceneLanguages,
    extractor: Box<dyn MetadataExtractor>,
}

impl SubsceneProvider<HttpConnector> {
    /// Creates a provider talking HTTP to `config.server_url`.
    pub fn new(config: ProviderConfig) -> Self {
        let connector = config.connector();
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> SubsceneProvider<C> {
    /// Creates a provider opening its sessions through `connector`.
    pub fn with_connector(config: ProviderConfig, connector: C) -> Self {
        Self {
            session: CatalogSession::new(config, connector),
            resolver: SubsceneLanguages,
            extractor: Box::new(ReleaseNameExtractor),
        }
    }

    /// Replaces the extractor used on release names.
    pub fn with_extractor(mut self, extractor: impl MetadataExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_open()
    }

    /// Filter state of the last search.
    pub fn filters(&self) -> &FilterState {
        self.session.filters()
    }

    fn query(&mut self, descriptor: &MediaDescriptor) -> Result<Vec<Subtitle>, ProviderError> {
        let release_name = descriptor.base_name();

        let subtitles = match self.simple_query(&release_name) {
            Ok(subtitles) => subtitles,
            Err(ProviderError::Transport(e)) => {
                warn!("Search for '{}' failed: {}", release_name, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let subtitles = if subtitles.is_empty() {
            self.extended_query(descriptor)?
        } else {
            subtitles
        };

        info!("Totally {} subtitles found", subtitles.len());
        Ok(subtitles)
    }

    fn simple_query(&self, query: &str) -> Result<Vec<Subtitle>, ProviderError> {
        let catalog = self.session.catalog()?;
        let subtitles = listing::search(&catalog, query, &SEARCH_RESULTS, None, |page| {
            self.subtitles_from_page(&catalog, page)
        })?;
        Ok(subtitles)
    }

    fn extended_query(&mut self, descriptor: &MediaDescriptor) -> Result<Vec<Subtitle>, ProviderError> {
        info!("Using extended search algorithm");

        self.session.disable_filters();
        let title = descriptor.search_title().to_lowercase();
        let canonical_page = self.find_canonical_page(&title);
        self.session.enable_filters();

        let Some(link) = canonical_page? else {
            info!("No catalog page found for '{}'", title);
            return Ok(Vec::new());
        };

        let catalog = self.session.catalog()?;
        let page = catalog.page(&link, &[])?;
        Ok(self.subtitles_from_page(&catalog, &page))
    }

    /// Follows the first subtitle titled `title` whose page links to the
    /// title's canonical page.
    fn find_canonical_page(&self, title: &str) -> Result<Option<String>, ProviderError> {
        let candidates = self.simple_query(title)?;
        let catalog = self.session.catalog()?;

        let matching = candidates
            .iter()
            .filter(|s| s.title().is_some_and(|t| t.to_lowercase() == title));

        for candidate in matching {
            let page = catalog.page(candidate.page_link(), &[])?;
            match page.breadcrumb_link() {
                Some(link) => return Ok(Some(link)),
                None => debug!("No catalog page linked from {}", candidate.page_link()),
            }
        }

        Ok(None)
    }

    fn subtitles_from_page(&self, catalog: &Catalog<'_, C::Session>, page: &CatalogPage) -> Vec<Subtitle> {
        let listing = read_listing(catalog, page, &self.resolver, None);

        let subtitles: Vec<Subtitle> = listing
            .rows
            .iter()
            .map(|row| Subtitle::baseline(row.params(&listing), self.extractor.extract(&row.name)))
            .collect();

        debug!("{} subtitles found", subtitles.len());
        subtitles
    }
}

impl<C: Connector> Provider for SubsceneProvider<C> {
    fn name(&self) -> &'static str {
        "subscene"
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
        let subtitles = self.query(descriptor)?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_bytes;
    use crate::filters::LANGUAGE_FILTER;
    use crate::provider::testing::{
        FakeCatalog, Row, TEST_SERVER, listing_page, search_results_page, subtitle_page,
    };

    fn provider(fake: &FakeCatalog) -> SubsceneProvider<FakeCatalog> {
        let config = ProviderConfig {
            server_url: TEST_SERVER.to_string(),
            ..ProviderConfig::default()
        };
        let mut provider = SubsceneProvider::with_connector(config, fake.clone());
        provider.initialize().unwrap();
        provider
    }

    fn english() -> BTreeSet<Language> {
        BTreeSet::from([Language::new("eng")])
    }

    fn episode() -> MediaDescriptor {
        MediaDescriptor::episode("/tv/Show.S02E05.720p-GRP.mkv", "Show", 2, 5)
    }

    #[test]
    fn test_release_listing_search() {
        let fake = FakeCatalog::default();
        fake.serve(
            "/subtitles/title?q=Show.S02E05.720p-GRP",
            listing_page(
                true,
                Some(2012),
                None,
                &[
                    Row::new("English", "/subtitles/show/english/1", "Show.S02E05.720p-GRP"),
                    Row::new("French", "/subtitles/show/french/2", "Show.S02E05.720p-GRP"),
                ],
            ),
        );
        let mut provider = provider(&fake);

        let subtitles = provider.list_subtitles(&episode(), &english()).unwrap();

        assert_eq!(subtitles.len(), 1);
        assert_eq!(subtitles[0].id(), "1");
        let matches = subtitles[0].get_matches(&episode());
        for expected in ["season", "episode", "name"] {
            assert!(matches.contains(expected), "missing {}", expected);
        }
        // baseline listings keep the guessed title as title
        assert!(!matches.contains("series"));

        let search = fake.request("/subtitles/title?q=Show.S02E05.720p-GRP").unwrap();
        assert_eq!(search.cookies.get(LANGUAGE_FILTER).map(String::as_str), Some("13"));
    }

    #[test]
    fn test_search_results_are_followed() {
        let fake = FakeCatalog::default();
        fake.serve(
            "/subtitles/title?q=Show.S02E05.720p-GRP",
            search_results_page(
                "search-results",
                &[
                    ("Show - First Season", "/subtitles/show-first-season"),
                    ("Show - Second Season", "/subtitles/show-second-season"),
                ],
            ),
        )
        .serve(
            "/subtitles/show-first-season",
            listing_page(false, None, None, &[Row::new("English", "/subtitles/a/english/1", "Show.S01E01")]),
        )
        .serve(
            "/subtitles/show-second-season",
            listing_page(false, None, None, &[Row::new("English", "/subtitles/b/english/2", "Show.S02E05")]),
        );
        let mut provider = provider(&fake);

        let subtitles = provider.list_subtitles(&episode(), &english()).unwrap();

        let ids: Vec<&str> = subtitles.iter().map(Subtitle::id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_search_triggers_extended_query() {
        let fake = FakeCatalog::default();
        fake.serve(
            "/subtitles/title?q=Show.S02E05.720p-GRP",
            "<html><body><p>No results found</p></body></html>",
        )
        .serve(
            "/subtitles/title?q=show",
            listing_page(
                true,
                None,
                None,
                &[
                    Row::new("English", "/subtitles/other/english/6", "Other.S01E01"),
                    Row::new("English", "/subtitles/show/english/7", "Show.S01E01"),
                ],
            ),
        )
        .serve("/subtitles/other/english/6", subtitle_page(None, None))
        .serve("/subtitles/show/english/7", subtitle_page(None, Some("/subtitles/show")))
        .serve(
            "/subtitles/show",
            listing_page(
                false,
                Some(2012),
                None,
                &[Row::new("English", "/subtitles/show/english/8", "Show.S02E05.HDTV")],
            ),
        );
        let mut provider = provider(&fake);

        let subtitles = provider.list_subtitles(&episode(), &english()).unwrap();

        assert_eq!(subtitles.len(), 1);
        assert_eq!(subtitles[0].id(), "8");
        assert_eq!(subtitles[0].info().number("year"), Some(2012));

        // broadened search without filters, final parse with filters
        let broad = fake.request("/subtitles/title?q=show").unwrap();
        assert!(!broad.cookies.contains_key(LANGUAGE_FILTER));
        let canonical = fake.request("/subtitles/show").unwrap();
        assert_eq!(canonical.cookies.get(LANGUAGE_FILTER).map(String::as_str), Some("13"));
        assert!(provider.filters().is_enabled());
    }

    #[test]
    fn test_extended_query_without_canonical_page() {
        let fake = FakeCatalog::default();
        fake.serve("/subtitles/title?q=Show.S02E05.720p-GRP", "<html></html>")
            .serve("/subtitles/title?q=show", "<html></html>");
        let mut provider = provider(&fake);

        let subtitles = provider.list_subtitles(&episode(), &english()).unwrap();

        assert!(subtitles.is_empty());
        assert!(provider.filters().is_enabled());
    }

    #[test]
    fn test_simple_query_failure_falls_back_to_extended_query() {
        let fake = FakeCatalog::default();
        fake.fail("/subtitles/title?q=Show.S02E05.720p-GRP", 503)
            .serve("/subtitles/title?q=show", "<html></html>");
        let mut provider = provider(&fake);

        assert!(provider.list_subtitles(&episode(), &english()).unwrap().is_empty());
        assert!(fake.request("/subtitles/title?q=show").is_some());
    }

    #[test]
    fn test_extended_query_failure_is_reported() {
        let fake = FakeCatalog::default();
        fake.fail("/subtitles/title?q=Show.S02E05.720p-GRP", 503);
        let mut provider = provider(&fake);

        let result = provider.list_subtitles(&episode(), &english());
        assert!(matches!(result, Err(ProviderError::Transport(_))));
        assert!(provider.filters().is_enabled());
    }

    #[test]
    fn test_list_requires_initialize() {
        let mut provider = SubsceneProvider::with_connector(ProviderConfig::default(), FakeCatalog::default());
        assert!(matches!(
            provider.list_subtitles(&episode(), &english()),
            Err(ProviderError::NotInitialized)
        ));
    }

    #[test]
    fn test_download_subtitle() {
        let fake = FakeCatalog::default();
        fake.serve(
            "/subtitles/title?q=Show.S02E05.720p-GRP",
            listing_page(true, None, None, &[Row::new("English", "/subtitles/show/english/1", "Show.S02E05")]),
        )
        .serve("/subtitles/show/english/1", subtitle_page(Some("/subtitle/download?id=1"), None))
        .serve("/subtitle/download?id=1", zip_bytes(&[("Show.S02E05.srt", b"1\r\nHi\r\n".as_slice())]));
        let mut provider = provider(&fake);

        let mut subtitles = provider.list_subtitles(&episode(), &english()).unwrap();
        provider.download_subtitle(&mut subtitles[0]).unwrap();

        assert_eq!(subtitles[0].content(), Some(&b"1\nHi\n"[..]));
    }

    #[test]
    fn test_languages() {
        let provider = SubsceneProvider::with_connector(ProviderConfig::default(), FakeCatalog::default());
        let languages = provider.languages();
        assert!(languages.contains(&Language::new("eng")));
        assert!(languages.contains(&Language::new("fas")));
    }
}
