//! Catalog pages
//!
//! `CatalogSession` holds a provider's transport session and filters,
//! `Catalog` fetches pages with the current filter cookies and `CatalogPage`
//! gives typed access to the parts of a page the search algorithm looks at.

use super::{ProviderConfig, ProviderError};
use crate::filters::FilterState;
use crate::language::{Language, LanguageResolver};
use crate::subtitle::SubtitleError;
use crate::transport::{Connector, Transport, TransportError};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Text only present on release name search results
pub(crate) const RELEASE_LISTING_MARKER: &str = "Subtitle search by";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static TABLE_ROW: Lazy<Selector> = Lazy::new(|| selector("tbody tr"));
static SPAN: Lazy<Selector> = Lazy::new(|| selector("span"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));
static LIST: Lazy<Selector> = Lazy::new(|| selector("ul"));
static HEARING_IMPAIRED_CELL: Lazy<Selector> = Lazy::new(|| selector("td.a41"));
static HEADER: Lazy<Selector> = Lazy::new(|| selector("div.header"));
static HEADER_STRONG: Lazy<Selector> = Lazy::new(|| selector("strong"));
static IMDB_LINK: Lazy<Selector> = Lazy::new(|| selector("a.imdb"));
static BREADCRUMB_LINK: Lazy<Selector> = Lazy::new(|| selector("div.bread a"));
static DOWNLOAD_LINK: Lazy<Selector> = Lazy::new(|| selector("div.download a"));

/// Container of title search results in the older catalog layout
pub(crate) static SEARCH_RESULTS: Lazy<Selector> = Lazy::new(|| selector("div.search-results"));
/// Container of title search results in the current catalog layout
pub(crate) static SEARCH_RESULT: Lazy<Selector> = Lazy::new(|| selector("div.search-result"));

/// Read access to a catalog server bound to a session and its filter cookies.
pub(crate) struct Catalog<'a, T: Transport> {
    session: &'a T,
    server_url: &'a str,
    cookies: &'a BTreeMap<String, String>,
}

impl<'a, T: Transport> Catalog<'a, T> {
    pub fn new(session: &'a T, server_url: &'a str, filters: &'a FilterState) -> Self {
        Self {
            session,
            server_url,
            cookies: filters.cookies(),
        }
    }

    /// Absolute URL of a catalog path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let server = self.server_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", server, path)
        } else {
            format!("{}/{}", server, path)
        }
    }

    /// Fetches and parses a catalog page.
    pub fn page(&self, path: &str, params: &[(&str, &str)]) -> Result<CatalogPage, TransportError> {
        let bytes = self.bytes(path, params)?;
        Ok(CatalogPage::parse(&bytes))
    }

    /// Fetches raw bytes from the catalog.
    pub fn bytes(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        debug!("Opening url '{}' with params '{:?}'", url, params);
        self.session.get(&url, params, self.cookies)
    }
}

/// Session and filter state of a catalog provider.
pub(crate) struct CatalogSession<C: Connector> {
    config: ProviderConfig,
    connector: C,
    session: Option<C::Session>,
    filters: FilterState,
}

impl<C: Connector> CatalogSession<C> {
    pub fn new(config: ProviderConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            session: None,
            filters: FilterState::default(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Opens the transport session unless one is already open.
    pub fn open(&mut self) -> Result<(), ProviderError> {
        if self.session.is_some() {
            return Ok(());
        }

        info!("Creating session for {}", self.config.server_url);
        self.session = Some(self.connector.connect()?);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.session.take().is_some() {
            info!("Closing session for {}", self.config.server_url);
        }
    }

    /// Catalog bound to the open session and the current filter cookies.
    pub fn catalog(&self) -> Result<Catalog<'_, C::Session>, ProviderError> {
        let session = self.session.as_ref().ok_or(ProviderError::NotInitialized)?;
        Ok(Catalog::new(session, &self.config.server_url, &self.filters))
    }

    /// Builds the filters of a new search and applies them.
    pub fn apply_filters(&mut self, languages: &BTreeSet<Language>, resolver: &dyn LanguageResolver) {
        self.filters = FilterState::create(languages, resolver).with_filters_enabled();
    }

    pub fn enable_filters(&mut self) {
        self.filters = self.filters.with_filters_enabled();
    }

    pub fn disable_filters(&mut self) {
        self.filters = self.filters.with_filters_disabled();
    }
}

/// A link of a title search result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchLink {
    pub text: String,
    pub href: String,
}

/// Cells of a listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowCells {
    pub page_link: String,
    pub name: String,
    pub hearing_impaired: bool,
}

/// A single row of a listing table.
pub(crate) struct RawRow<'a> {
    element: ElementRef<'a>,
}

impl RawRow<'_> {
    /// The language label of the row (its first span).
    pub fn language_label(&self) -> Option<String> {
        self.element
            .select(&SPAN)
            .next()
            .map(text_of)
            .filter(|label| !label.is_empty())
    }

    /// Page link, release name and hearing impaired flag of the row.
    pub fn cells(&self) -> Result<RowCells, SubtitleError> {
        let page_link = self
            .element
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| SubtitleError::MalformedRow("row has no subtitle link".to_string()))?
            .to_string();

        let name = self
            .element
            .select(&SPAN)
            .nth(1)
            .map(text_of)
            .ok_or_else(|| SubtitleError::MalformedRow(format!("row {} has no name", page_link)))?;

        let hearing_impaired = self.element.select(&HEARING_IMPAIRED_CELL).next().is_some();

        Ok(RowCells {
            page_link,
            name,
            hearing_impaired,
        })
    }
}

/// A parsed catalog page.
pub(crate) struct CatalogPage {
    raw: String,
    document: Html,
}

impl CatalogPage {
    pub fn parse(bytes: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(bytes).into_owned();
        let document = Html::parse_document(&raw);
        Self { raw, document }
    }

    /// Whether the page is a release name listing.
    pub fn is_release_listing(&self) -> bool {
        self.raw.contains(RELEASE_LISTING_MARKER)
    }

    /// Rows of the first table on the page.
    pub fn rows(&self) -> Vec<RawRow<'_>> {
        self.document
            .select(&TABLE)
            .next()
            .map(|table| {
                table
                    .select(&TABLE_ROW)
                    .map(|element| RawRow { element })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Year from the page header ("Year: 2012").
    pub fn listing_year(&self) -> Option<u32> {
        let header = self.document.select(&HEADER).next()?;
        let strong = header.select(&HEADER_STRONG).next()?;
        let parent = strong.parent().and_then(ElementRef::wrap)?;
        let text = text_of(parent);
        text.chars().skip(5).collect::<String>().trim().parse().ok()
    }

    /// External identifier linked from the page header.
    pub fn imdb_id(&self) -> Option<String> {
        let header = self.document.select(&HEADER).next()?;
        let href = header.select(&IMDB_LINK).next()?.value().attr("href")?;
        href.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// Link to the catalog's canonical page of the title.
    pub fn breadcrumb_link(&self) -> Option<String> {
        self.first_href(&BREADCRUMB_LINK)
    }

    /// Link to the downloadable archive of a subtitle page.
    pub fn download_link(&self) -> Option<String> {
        self.first_href(&DOWNLOAD_LINK)
    }

    /// Links of a title search result list, `None` if the page has no
    /// `container`.
    pub fn search_result_links(&self, container: &Selector) -> Option<Vec<SearchLink>> {
        let container = self.document.select(container).next()?;
        let links = container
            .select(&LIST)
            .next()
            .map(|list| {
                list.select(&LINK)
                    .filter_map(|a| {
                        let href = a.value().attr("href")?;
                        Some(SearchLink {
                            text: text_of(a),
                            href: href.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(links)
    }

    fn first_href(&self, selector: &Selector) -> Option<String> {
        self.document
            .select(selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::{listing_page, search_results_page, subtitle_page, Row};

    #[test]
    fn test_selectors_parse() {
        for selector in [
            &TABLE,
            &TABLE_ROW,
            &SPAN,
            &LINK,
            &LIST,
            &HEARING_IMPAIRED_CELL,
            &HEADER,
            &HEADER_STRONG,
            &IMDB_LINK,
            &BREADCRUMB_LINK,
            &DOWNLOAD_LINK,
            &SEARCH_RESULTS,
            &SEARCH_RESULT,
        ] {
            Lazy::force(selector);
        }
    }

    #[test]
    fn test_url_joining() {
        let session = crate::provider::testing::FakeCatalog::default();
        let filters = FilterState::default();
        let catalog = Catalog::new(&session, "https://subscene.test/", &filters);

        assert_eq!(catalog.url("/subtitles/title"), "https://subscene.test/subtitles/title");
        assert_eq!(catalog.url("subtitles/x"), "https://subscene.test/subtitles/x");
        assert_eq!(catalog.url("https://cdn.test/a.zip"), "https://cdn.test/a.zip");
    }

    #[test]
    fn test_session_lifecycle() {
        let fake = crate::provider::testing::FakeCatalog::default();
        let mut session = CatalogSession::new(ProviderConfig::default(), fake.clone());
        assert!(matches!(session.catalog(), Err(ProviderError::NotInitialized)));

        session.open().unwrap();
        session.open().unwrap();
        assert!(session.is_open());
        assert_eq!(fake.connections(), 1);

        session.close();
        session.close();
        assert!(!session.is_open());
    }

    #[test]
    fn test_session_filter_transitions() {
        let fake = crate::provider::testing::FakeCatalog::default();
        let mut session = CatalogSession::new(ProviderConfig::default(), fake);
        let languages = BTreeSet::from([Language::new("eng")]);

        session.apply_filters(&languages, &crate::language::SubsceneLanguages);
        assert!(session.filters().is_enabled());
        session.disable_filters();
        assert!(session.filters().cookies().is_empty());
        session.enable_filters();
        assert!(session.filters().is_enabled());
    }

    #[test]
    fn test_listing_rows_and_header() {
        let html = listing_page(
            true,
            Some(2012),
            Some("http://www.imdb.com/title/tt1234567/"),
            &[
                Row::new("English", "/subtitles/show/english/1", "Show.S02E05.720p-GRP"),
                Row::new("French", "/subtitles/show/french/2", "Show.S02E05.HDTV").hearing_impaired(),
            ],
        );
        let page = CatalogPage::parse(html.as_bytes());

        assert!(page.is_release_listing());
        assert_eq!(page.listing_year(), Some(2012));
        assert_eq!(page.imdb_id().as_deref(), Some("tt1234567"));

        let rows = page.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].language_label().as_deref(), Some("English"));
        let cells = rows[1].cells().unwrap();
        assert_eq!(cells.page_link, "/subtitles/show/french/2");
        assert_eq!(cells.name, "Show.S02E05.HDTV");
        assert!(cells.hearing_impaired);
        assert!(!rows[0].cells().unwrap().hearing_impaired);
    }

    #[test]
    fn test_malformed_row() {
        let html = "<table><tbody><tr><td><span>English</span></td></tr></tbody></table>";
        let page = CatalogPage::parse(html.as_bytes());
        let rows = page.rows();

        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0].cells(), Err(SubtitleError::MalformedRow(_))));
    }

    #[test]
    fn test_page_without_table() {
        let page = CatalogPage::parse(b"<html><body><p>nothing</p></body></html>");
        assert!(page.rows().is_empty());
        assert!(!page.is_release_listing());
        assert_eq!(page.listing_year(), None);
        assert!(page.search_result_links(&SEARCH_RESULT).is_none());
    }

    #[test]
    fn test_search_result_links() {
        let html = search_results_page(
            "search-result",
            &[
                ("Show - Second Season (2012)", "/subtitles/show-second-season"),
                ("Show - Third Season (2013)", "/subtitles/show-third-season"),
            ],
        );
        let page = CatalogPage::parse(html.as_bytes());

        let links = page.search_result_links(&SEARCH_RESULT).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "Show - Second Season (2012)");
        assert_eq!(links[1].href, "/subtitles/show-third-season");
        assert!(page.search_result_links(&SEARCH_RESULTS).is_none());
    }

    #[test]
    fn test_subtitle_page_links() {
        let html = subtitle_page(Some("/subtitle/download?id=1"), Some("/subtitles/show"));
        let page = CatalogPage::parse(html.as_bytes());

        assert_eq!(page.download_link().as_deref(), Some("/subtitle/download?id=1"));
        assert_eq!(page.breadcrumb_link().as_deref(), Some("/subtitles/show"));
    }
}
