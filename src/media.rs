//! Media descriptors
//!
//! A `MediaDescriptor` describes the local video file a subtitle is searched
//! for. It is the ground truth every candidate subtitle is compared against.

use crate::extraction::{AttrValue, MetadataExtractor, attribute};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while describing a media file
#[derive(Debug, Error)]
pub enum MediaError {
    /// Not enough information could be guessed from the file name
    #[error("Insufficient information to describe {0}")]
    InsufficientInfo(PathBuf),
}

/// What kind of media a descriptor represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    /// A feature film
    Movie {
        /// The movie title
        title: String,
    },
    /// A single episode of a TV series
    Episode {
        /// The series name
        series: String,
        /// Season number (positive)
        season: u32,
        /// Episode number within the season (positive)
        episode: u32,
        /// The episode title, when known
        title: Option<String>,
        /// External identifier of the series
        series_imdb_id: Option<String>,
    },
}

/// Immutable description of a local media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    /// Path (or bare name) of the media file
    pub name: PathBuf,
    /// Movie or episode specific attributes
    pub kind: MediaKind,
    pub year: Option<u32>,
    pub format: Option<String>,
    pub release_group: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub imdb_id: Option<String>,
    pub resolution: Option<String>,
    pub hearing_impaired: bool,
}

impl MediaDescriptor {
    /// Describes a movie.
    pub fn movie(name: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self::with_kind(
            name.into(),
            MediaKind::Movie {
                title: title.into(),
            },
        )
    }

    /// Describes an episode.
    pub fn episode(
        name: impl Into<PathBuf>,
        series: impl Into<String>,
        season: u32,
        episode: u32,
    ) -> Self {
        Self::with_kind(
            name.into(),
            MediaKind::Episode {
                series: series.into(),
                season,
                episode,
                title: None,
                series_imdb_id: None,
            },
        )
    }

    fn with_kind(name: PathBuf, kind: MediaKind) -> Self {
        Self {
            name,
            kind,
            year: None,
            format: None,
            release_group: None,
            video_codec: None,
            audio_codec: None,
            imdb_id: None,
            resolution: None,
            hearing_impaired: false,
        }
    }

    /// Describes a media file by guessing its attributes from the file name.
    ///
    /// Files whose name carries a season and an episode number become
    /// episodes, everything else becomes a movie.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InsufficientInfo` if no title can be guessed.
    pub fn from_path(path: &Path, extractor: &dyn MetadataExtractor) -> Result<Self, MediaError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let info = extractor.extract(&file_name);

        let title = info
            .text(attribute::TITLE)
            .map(str::to_string)
            .ok_or_else(|| MediaError::InsufficientInfo(path.to_path_buf()))?;

        let mut descriptor = match (info.number(attribute::SEASON), info.number(attribute::EPISODE)) {
            (Some(season), Some(episode)) if season > 0 && episode > 0 => {
                let mut descriptor = Self::episode(path, title, season, episode);
                if let MediaKind::Episode { title, .. } = &mut descriptor.kind {
                    *title = info.text(attribute::EPISODE_TITLE).map(str::to_string);
                }
                descriptor
            }
            _ => Self::movie(path, title),
        };

        descriptor.year = info.number(attribute::YEAR);
        descriptor.format = info.text(attribute::FORMAT).map(str::to_string);
        descriptor.release_group = info.text(attribute::RELEASE_GROUP).map(str::to_string);
        descriptor.video_codec = info.text(attribute::VIDEO_CODEC).map(str::to_string);
        descriptor.audio_codec = info.text(attribute::AUDIO_CODEC).map(str::to_string);
        descriptor.resolution = info.text(attribute::SCREEN_SIZE).map(str::to_string);
        descriptor.hearing_impaired =
            info.get(attribute::HEARING_IMPAIRED) == Some(&AttrValue::Flag(true));

        Ok(descriptor)
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn with_release_group(mut self, group: impl Into<String>) -> Self {
        self.release_group = Some(group.into());
        self
    }

    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }

    /// Sets the episode title. Has no effect on movies.
    pub fn with_episode_title(mut self, episode_title: impl Into<String>) -> Self {
        if let MediaKind::Episode { title, .. } = &mut self.kind {
            *title = Some(episode_title.into());
        }
        self
    }

    /// Sets the series identifier. Has no effect on movies.
    pub fn with_series_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        if let MediaKind::Episode { series_imdb_id, .. } = &mut self.kind {
            *series_imdb_id = Some(imdb_id.into());
        }
        self
    }

    pub fn is_episode(&self) -> bool {
        matches!(self.kind, MediaKind::Episode { .. })
    }

    pub fn season(&self) -> Option<u32> {
        match self.kind {
            MediaKind::Episode { season, .. } => Some(season),
            MediaKind::Movie { .. } => None,
        }
    }

    pub fn episode_number(&self) -> Option<u32> {
        match self.kind {
            MediaKind::Episode { episode, .. } => Some(episode),
            MediaKind::Movie { .. } => None,
        }
    }

    /// The name used to look the media up in a catalog by title:
    /// the series for episodes, the title for movies.
    pub fn search_title(&self) -> &str {
        match &self.kind {
            MediaKind::Movie { title } => title,
            MediaKind::Episode { series, .. } => series,
        }
    }

    /// File name without directories and extension.
    pub fn base_name(&self) -> String {
        self.name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Looks up an attribute by name.
    ///
    /// Attributes without information (absent, empty, zero or `false`)
    /// are reported as absent.
    pub fn attribute(&self, name: &str) -> Option<AttrValue> {
        let text = |value: &Option<String>| value.clone().map(AttrValue::Text);

        let value = match (name, &self.kind) {
            (attribute::TITLE, MediaKind::Movie { title }) => Some(AttrValue::Text(title.clone())),
            (attribute::TITLE, MediaKind::Episode { title, .. }) => text(title),
            (attribute::SERIES, MediaKind::Episode { series, .. }) => {
                Some(AttrValue::Text(series.clone()))
            }
            (attribute::SEASON, MediaKind::Episode { season, .. }) => {
                Some(AttrValue::Number(*season))
            }
            (attribute::EPISODE, MediaKind::Episode { episode, .. }) => {
                Some(AttrValue::Number(*episode))
            }
            (attribute::SERIES_IMDB_ID, MediaKind::Episode { series_imdb_id, .. }) => {
                text(series_imdb_id)
            }
            (attribute::YEAR, _) => self.year.map(AttrValue::Number),
            (attribute::FORMAT, _) => text(&self.format),
            (attribute::RELEASE_GROUP, _) => text(&self.release_group),
            (attribute::VIDEO_CODEC, _) => text(&self.video_codec),
            (attribute::AUDIO_CODEC, _) => text(&self.audio_codec),
            (attribute::IMDB_ID, _) => text(&self.imdb_id),
            (attribute::RESOLUTION, _) => text(&self.resolution),
            (attribute::HEARING_IMPAIRED, _) => Some(AttrValue::Flag(self.hearing_impaired)),
            _ => None,
        };

        value.filter(AttrValue::is_truthy)
    }
}
