//! subscout - Find subtitles for video files in online catalogs
//!
//! This library describes a video file from its name, searches a subtitle
//! catalog for matching subtitles, ranks them by how well they fit the file
//! and downloads the chosen one.

mod archive;
mod cache;
mod extraction;
mod filters;
mod language;
mod matching;
mod media;
mod ordinal;
mod provider;
mod subtitle;
mod transport;

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// Re-export error types
pub use archive::ArchiveError;
pub use cache::CacheError;
pub use language::LanguageError;
pub use media::MediaError;
pub use provider::ProviderError;
pub use subtitle::SubtitleError;
pub use transport::TransportError;

pub use archive::{SUBTITLE_EXTENSION, SubtitleArchive, fix_line_ending};
pub use cache::CacheStorage;
pub use extraction::{AttrValue, ExtractedInfo, MetadataExtractor, ReleaseNameExtractor, attribute};
pub use filters::FilterState;
pub use language::{Language, LanguageResolver, SubsceneLanguages};
pub use matching::{MatchSet, SubtitleFlavor};
pub use media::{MediaDescriptor, MediaKind};
pub use ordinal::ordinal_words;
pub use provider::{
    CachedProvider, DEFAULT_SERVER_URL, LanguageAwareSubsceneProvider, Provider, ProviderConfig,
    ProviderGuard, SubsceneProvider,
};
pub use subtitle::{Subtitle, SubtitleParams};
pub use transport::{Connector, HttpConnector, HttpSession, Transport};

/// Provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Subscene, searching by release name then by title
    #[default]
    Subscene,
    /// Subscene, with language and season aware listing parsing
    LanguageAware,
}

/// Options of a subtitle search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// The provider to search
    pub provider: ProviderKind,
    /// Settings of the provider
    pub config: ProviderConfig,
    /// How long search results are cached, `None` disables the cache
    pub cache_ttl: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            config: ProviderConfig::default(),
            cache_ttl: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}

/// Progress event emitted during a search or download
///
/// These events allow library users to track progress and provide feedback
/// while the catalog is queried.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Search started
    Started { video_path: PathBuf },

    /// The video file was described from its name
    MediaDescribed { descriptor: MediaDescriptor },

    /// Querying a provider
    Searching { provider: &'static str },

    /// The provider returned its subtitles
    SubtitlesFound { count: usize },

    /// Search complete, subtitles ranked
    Complete { best_score: Option<usize> },

    /// Downloading a subtitle
    Downloading { subtitle_id: String },

    /// Subtitle content downloaded
    Downloaded { size: usize },
}

/// A subtitle together with the attributes it matched
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSubtitle {
    /// The subtitle found in the catalog
    pub subtitle: Subtitle,

    /// Attributes the subtitle shares with the video file
    pub matches: MatchSet,
}

impl RankedSubtitle {
    /// Number of matched attributes
    pub fn score(&self) -> usize {
        self.matches.len()
    }
}

/// Top-level error type for subscout operations
#[derive(Debug, Error)]
pub enum SubscoutError {
    /// The video file could not be described
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// A language could not be understood
    #[error("Language error: {0}")]
    Language(#[from] LanguageError),

    /// Error while searching or downloading
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Builds the provider selected by `options`, wrapped in a cache when a TTL
/// is set
///
/// # Errors
///
/// Returns `SubscoutError::Cache` if the cache directory cannot be opened.
pub fn build_provider(options: &SearchOptions) -> Result<Box<dyn Provider>, SubscoutError> {
    let provider: Box<dyn Provider> = match options.provider {
        ProviderKind::Subscene => Box::new(SubsceneProvider::new(options.config.clone())),
        ProviderKind::LanguageAware => {
            Box::new(LanguageAwareSubsceneProvider::new(options.config.clone()))
        }
    };

    match options.cache_ttl {
        Some(ttl) => {
            let cache = CacheStorage::open("searches", Some(ttl))?;
            Ok(Box::new(CachedProvider::new(provider, cache)))
        }
        None => Ok(provider),
    }
}

/// Searches subtitles for a video file
///
/// Describes the video from its file name, queries the provider selected by
/// `options` and ranks the subtitles found by the number of attributes they
/// share with the video.
///
/// # Arguments
///
/// * `video_path` - The video file to find subtitles for
/// * `languages` - Languages to search subtitles in
/// * `options` - Provider selection and settings
/// * `progress_callback` - Closure called with progress events (can be empty for silent operation)
///
/// # Returns
///
/// The subtitles found, best match first. An empty vector means nothing was
/// found.
///
/// # Examples
///
/// ```no_run
/// use subscout::{search_subtitles, Language, SearchOptions};
/// use std::collections::BTreeSet;
/// use std::path::Path;
///
/// let languages = BTreeSet::from([Language::new("eng")]);
/// let ranked = search_subtitles(
///     Path::new("/videos/Show.S02E05.720p.HDTV.x264-GRP.mkv"),
///     &languages,
///     &SearchOptions::default(),
///     |_| {}, // Ignore all progress events
/// )
/// .unwrap();
///
/// for entry in ranked {
///     println!("{} ({} matches)", entry.subtitle.release_name(), entry.score());
/// }
/// ```
pub fn search_subtitles<F>(
    video_path: &Path,
    languages: &BTreeSet<Language>,
    options: &SearchOptions,
    progress_callback: F,
) -> Result<Vec<RankedSubtitle>, SubscoutError>
where
    F: FnMut(ProgressEvent),
{
    let mut provider = build_provider(options)?;
    search_subtitles_with(&mut provider, video_path, languages, progress_callback)
}

/// Searches subtitles for a video file with the given provider
///
/// The provider is initialized for the search and terminated afterwards.
pub fn search_subtitles_with<P, F>(
    provider: &mut P,
    video_path: &Path,
    languages: &BTreeSet<Language>,
    mut progress_callback: F,
) -> Result<Vec<RankedSubtitle>, SubscoutError>
where
    P: Provider + ?Sized,
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Started {
        video_path: video_path.to_path_buf(),
    });

    let descriptor = MediaDescriptor::from_path(video_path, &ReleaseNameExtractor)?;
    progress_callback(ProgressEvent::MediaDescribed {
        descriptor: descriptor.clone(),
    });

    progress_callback(ProgressEvent::Searching {
        provider: provider.name(),
    });
    let subtitles = {
        let mut session = ProviderGuard::open(provider)?;
        session.list_subtitles(&descriptor, languages)?
    };
    progress_callback(ProgressEvent::SubtitlesFound {
        count: subtitles.len(),
    });

    let ranked = rank_subtitles(subtitles, &descriptor);

    progress_callback(ProgressEvent::Complete {
        best_score: ranked.first().map(RankedSubtitle::score),
    });

    Ok(ranked)
}

/// Ranks subtitles by the size of their match set, best first
///
/// Subtitles with equal scores keep the order the provider returned them in.
pub fn rank_subtitles(subtitles: Vec<Subtitle>, descriptor: &MediaDescriptor) -> Vec<RankedSubtitle> {
    let mut ranked: Vec<RankedSubtitle> = subtitles
        .into_iter()
        .map(|subtitle| {
            let matches = subtitle.get_matches(descriptor);
            RankedSubtitle { subtitle, matches }
        })
        .collect();

    ranked.sort_by(|a, b| b.score().cmp(&a.score()));
    ranked
}

/// Downloads the content of a subtitle found by `search_subtitles`
///
/// # Errors
///
/// Returns `SubscoutError::Provider` if the subtitle cannot be downloaded.
pub fn download_subtitle<F>(
    subtitle: &mut Subtitle,
    options: &SearchOptions,
    progress_callback: F,
) -> Result<(), SubscoutError>
where
    F: FnMut(ProgressEvent),
{
    let mut provider = build_provider(options)?;
    download_subtitle_with(&mut provider, subtitle, progress_callback)
}

/// Downloads the content of a subtitle with the given provider
pub fn download_subtitle_with<P, F>(
    provider: &mut P,
    subtitle: &mut Subtitle,
    mut progress_callback: F,
) -> Result<(), SubscoutError>
where
    P: Provider + ?Sized,
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Downloading {
        subtitle_id: subtitle.id().to_string(),
    });

    {
        let mut session = ProviderGuard::open(provider)?;
        session.download_subtitle(subtitle)?;
    }

    progress_callback(ProgressEvent::Downloaded {
        size: subtitle.content().map_or(0, <[u8]>::len),
    });

    Ok(())
}

/// Path the subtitle of `video_path` is saved to: `<stem>.<language>.srt`
/// next to the video
pub fn subtitle_path(video_path: &Path, language: &Language) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    video_path.with_file_name(format!("{}.{}{}", stem, language, SUBTITLE_EXTENSION))
}
