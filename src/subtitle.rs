//! Subtitle entities
//!
//! A `Subtitle` is one candidate found in a catalog listing. It carries the
//! attributes guessed from its release name and knows how to compare itself
//! against a media descriptor.

use crate::extraction::{ExtractedInfo, attribute};
use crate::language::Language;
use crate::matching::{MatchSet, SubtitleFlavor};
use crate::media::MediaDescriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while turning a listing row into a subtitle
#[derive(Debug, Error)]
pub enum SubtitleError {
    /// The listing row lacks an expected cell or link
    #[error("Malformed listing row: {0}")]
    MalformedRow(String),

    /// The release name did not yield the attributes required for the subtitle
    #[error("Insufficient guess data for '{0}'")]
    InsufficientGuessData(String),
}

/// Raw values read from a listing row plus listing level context.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleParams {
    pub language: Language,
    pub hearing_impaired: bool,
    pub page_link: String,
    pub name: String,
    /// Year parsed from the listing header
    pub year: Option<u32>,
    /// External identifier recovered from the listing's parent page
    pub imdb_id: Option<String>,
    /// The listing belongs to a TV series
    pub is_series: bool,
    /// The release bundles a whole season
    pub is_pack: bool,
    /// Episode number to assume for season packs
    pub force_episode: Option<u32>,
}

impl SubtitleParams {
    pub fn new(
        language: Language,
        hearing_impaired: bool,
        page_link: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            language,
            hearing_impaired,
            page_link: page_link.into(),
            name: name.into(),
            year: None,
            imdb_id: None,
            is_series: false,
            is_pack: false,
            force_episode: None,
        }
    }
}

/// A subtitle found in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    language: Language,
    hearing_impaired: bool,
    page_link: String,
    release_name: String,
    info: ExtractedInfo,
    is_pack: bool,
    imdb_id: Option<String>,
    flavor: SubtitleFlavor,
    #[serde(skip)]
    content: Option<Vec<u8>>,
}

impl Subtitle {
    /// Builds a subtitle of a plain listing.
    ///
    /// `info` is what the extractor guessed from `params.name`; the listing
    /// year overrides the guessed one.
    pub fn baseline(params: SubtitleParams, mut info: ExtractedInfo) -> Self {
        if let Some(year) = params.year {
            info.insert(attribute::YEAR, year);
        }

        Self {
            language: params.language,
            hearing_impaired: params.hearing_impaired,
            page_link: params.page_link,
            release_name: params.name,
            info,
            is_pack: false,
            imdb_id: params.imdb_id,
            flavor: SubtitleFlavor::Baseline,
            content: None,
        }
    }

    /// Builds a subtitle of a language and season aware listing.
    ///
    /// On top of the baseline rules: season packs get the forced episode,
    /// `screen_size` is exposed as `resolution`, and for series the guessed
    /// title becomes the series while the episode title becomes the title.
    ///
    /// # Errors
    ///
    /// Returns `SubtitleError::InsufficientGuessData` when a series release
    /// name yields no title.
    pub fn language_aware(
        params: SubtitleParams,
        mut info: ExtractedInfo,
    ) -> Result<Self, SubtitleError> {
        if let Some(year) = params.year {
            info.insert(attribute::YEAR, year);
        }

        if params.is_pack && !info.contains(attribute::EPISODE) {
            if let Some(episode) = params.force_episode {
                info.insert(attribute::EPISODE, episode);
            }
        }

        if let Some(screen_size) = info.get(attribute::SCREEN_SIZE).cloned() {
            info.insert(attribute::RESOLUTION, screen_size);
        }

        if params.is_series {
            let title = info
                .remove(attribute::TITLE)
                .ok_or_else(|| SubtitleError::InsufficientGuessData(params.name.clone()))?;
            info.insert(attribute::SERIES, title);

            if let Some(episode_title) = info.get(attribute::EPISODE_TITLE).cloned() {
                info.insert(attribute::TITLE, episode_title);
            }
            if let Some(imdb_id) = &params.imdb_id {
                info.insert(attribute::SERIES_IMDB_ID, imdb_id.as_str());
            }
        } else if let Some(imdb_id) = &params.imdb_id {
            info.insert(attribute::IMDB_ID, imdb_id.as_str());
        }

        Ok(Self {
            language: params.language,
            hearing_impaired: params.hearing_impaired,
            page_link: params.page_link,
            release_name: params.name,
            info,
            is_pack: params.is_pack,
            imdb_id: params.imdb_id,
            flavor: SubtitleFlavor::LanguageAware,
            content: None,
        })
    }

    /// Identity of the subtitle: the last segment of its page link.
    pub fn id(&self) -> &str {
        let link = self.page_link.trim_end_matches('/');
        link.rsplit('/').next().unwrap_or(link)
    }

    /// Title guessed from the release name.
    pub fn title(&self) -> Option<&str> {
        self.info.text(attribute::TITLE)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn hearing_impaired(&self) -> bool {
        self.hearing_impaired
    }

    pub fn page_link(&self) -> &str {
        &self.page_link
    }

    pub fn release_name(&self) -> &str {
        &self.release_name
    }

    pub fn info(&self) -> &ExtractedInfo {
        &self.info
    }

    pub fn is_pack(&self) -> bool {
        self.is_pack
    }

    pub fn imdb_id(&self) -> Option<&str> {
        self.imdb_id.as_deref()
    }

    pub fn flavor(&self) -> SubtitleFlavor {
        self.flavor
    }

    /// Downloaded content, once `Provider::download_subtitle` succeeded.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    pub(crate) fn set_content(&mut self, content: Vec<u8>) {
        self.content = Some(content);
    }

    /// Attributes on which this subtitle agrees with `descriptor`.
    pub fn get_matches(&self, descriptor: &MediaDescriptor) -> MatchSet {
        self.flavor
            .matches(&self.info, &self.release_name, descriptor)
    }
}
