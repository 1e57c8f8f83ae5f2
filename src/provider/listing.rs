//! Listing pages
//!
//! Turns the table of a listing page into typed rows and downloads the
//! subtitle behind a row. Shared by every catalog provider.

use super::ProviderError;
use super::catalog::{Catalog, CatalogPage};
use crate::archive::{SubtitleArchive, fix_line_ending};
use crate::language::{Language, LanguageResolver};
use crate::subtitle::{Subtitle, SubtitleParams};
use crate::transport::{Transport, TransportError};
use scraper::Selector;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Path of the catalog's search
pub(crate) const SEARCH_PATH: &str = "/subtitles/title";

/// A row of a listing table that survived language resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListingRow {
    pub language: Language,
    pub page_link: String,
    pub name: String,
    pub hearing_impaired: bool,
}

/// A parsed listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Listing {
    /// Year shown in the page header
    pub year: Option<u32>,
    /// External identifier recovered from the first row's page
    pub imdb_id: Option<String>,
    pub rows: Vec<ListingRow>,
}

impl ListingRow {
    /// Subtitle parameters of the row in the context of `listing`.
    pub fn params(&self, listing: &Listing) -> SubtitleParams {
        let mut params = SubtitleParams::new(
            self.language.clone(),
            self.hearing_impaired,
            self.page_link.as_str(),
            self.name.as_str(),
        );
        params.year = listing.year;
        params.imdb_id = listing.imdb_id.clone();
        params
    }
}

/// Runs a catalog search and collects the subtitles of the pages it leads to.
///
/// A release name listing is parsed directly. When the result is no such
/// listing, or the listing yields nothing, every link of the `results`
/// container is followed and parsed; links whose lowercased text lacks
/// `verify_token` are left alone. A page without the container yields
/// nothing.
pub(crate) fn search<T, F>(
    catalog: &Catalog<'_, T>,
    query: &str,
    results: &Selector,
    verify_token: Option<&str>,
    mut parse: F,
) -> Result<Vec<Subtitle>, TransportError>
where
    T: Transport,
    F: FnMut(&CatalogPage) -> Vec<Subtitle>,
{
    info!("Searching for '{}'", query);
    let page = catalog.page(SEARCH_PATH, &[("q", query)])?;

    let mut subtitles = if page.is_release_listing() {
        parse(&page)
    } else {
        Vec::new()
    };
    if !subtitles.is_empty() {
        return Ok(subtitles);
    }

    let Some(links) = page.search_result_links(results) else {
        debug!("No search results for '{}'", query);
        return Ok(subtitles);
    };

    for link in links {
        if let Some(token) = verify_token {
            if !link.text.to_lowercase().contains(token) {
                debug!("Skipping '{}', it does not mention '{}'", link.text, token);
                continue;
            }
        }

        info!("Extracting subtitles for '{}'", link.text);
        let page = catalog.page(&link.href, &[])?;
        subtitles.extend(parse(&page));
    }

    Ok(subtitles)
}

/// Reads the rows of a listing page.
///
/// Rows whose language label cannot be resolved, rows in languages outside
/// `language_guard` and malformed rows are skipped. The page of the first
/// kept row is fetched once to recover the external identifier; failing to
/// do so leaves the identifier unset.
///
/// # Arguments
///
/// * `catalog` - Catalog used for the identifier lookup
/// * `page` - The listing page
/// * `resolver` - Maps language labels to languages
/// * `language_guard` - When set, rows in other languages are skipped before
///   any further parsing
pub(crate) fn read_listing<T: Transport>(
    catalog: &Catalog<'_, T>,
    page: &CatalogPage,
    resolver: &dyn LanguageResolver,
    language_guard: Option<&BTreeSet<Language>>,
) -> Listing {
    let mut listing = Listing {
        year: page.listing_year(),
        ..Listing::default()
    };
    let mut identifier_checked = false;

    let rows = page.rows();
    if rows.is_empty() {
        debug!("Listing page has no rows");
    }

    for row in rows {
        let Some(label) = row.language_label() else {
            debug!("Skipping row without language label");
            continue;
        };

        let language = match resolver.resolve(&label) {
            Ok(language) => language,
            Err(e) => {
                debug!("Skipping row: {}", e);
                continue;
            }
        };

        if let Some(guard) = language_guard {
            if !guard.contains(&language) {
                continue;
            }
        }

        let cells = match row.cells() {
            Ok(cells) => cells,
            Err(e) => {
                debug!("Skipping row: {}", e);
                continue;
            }
        };

        if !identifier_checked {
            identifier_checked = true;
            listing.imdb_id = recover_identifier(catalog, &cells.page_link);
        }

        listing.rows.push(ListingRow {
            language,
            page_link: cells.page_link,
            name: cells.name,
            hearing_impaired: cells.hearing_impaired,
        });
    }

    debug!("Listing has {} usable rows", listing.rows.len());
    listing
}

/// Reads the external identifier from a subtitle's page.
fn recover_identifier<T: Transport>(catalog: &Catalog<'_, T>, page_link: &str) -> Option<String> {
    match catalog.page(page_link, &[]) {
        Ok(page) => page.imdb_id(),
        Err(e) => {
            debug!("Could not recover identifier from '{}': {}", page_link, e);
            None
        }
    }
}

/// Downloads `subtitle` and stores the first subtitle file of its archive.
pub(crate) fn download<T: Transport>(
    catalog: &Catalog<'_, T>,
    subtitle: &mut Subtitle,
) -> Result<(), ProviderError> {
    info!("Downloading subtitle {}", subtitle.id());

    let page = catalog.page(subtitle.page_link(), &[])?;
    let link = page.download_link().ok_or_else(|| {
        ProviderError::ContentNotFound(format!("no download link on {}", subtitle.page_link()))
    })?;

    let bytes = catalog.bytes(&link, &[])?;
    let mut archive = SubtitleArchive::open(bytes)?;
    let entry = archive.first_subtitle_entry().ok_or_else(|| {
        ProviderError::ContentNotFound(format!("no subtitle file in archive of {}", subtitle.id()))
    })?;
    debug!("Extracting '{}'", entry);

    let content = archive.read(&entry)?;
    subtitle.set_content(fix_line_ending(&content));
    Ok(())
}
